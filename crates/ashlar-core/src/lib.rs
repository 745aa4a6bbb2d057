//! Ashlar shared contracts
//!
//! The narrow interfaces every layer of the cipher pipeline is built
//! against: keyed primitives (block ciphers, keystream generators,
//! digests), the constructions consuming them (modes, MACs, padding), the
//! tagged parameter type carried into every `init`, and the recoverable
//! error type.
//!
//! # Error model
//!
//! Failures split into two classes:
//!
//! - Programmer/configuration errors (short block buffers, wrong IV
//!   length, a parameter variant the target does not accept) are violated
//!   preconditions. They panic at the offending call and are not
//!   representable as values.
//! - Data/runtime errors (tag mismatch, corrupted padding, short output
//!   at finalize) are surfaced as [`CryptoError`] results the caller must
//!   check. No partial output is produced on these paths.
//!
//! # Concurrency
//!
//! Everything here is single-threaded and synchronous. A wrapper
//! exclusively owns the primitive it was constructed with; instances are
//! cheap, so concurrent callers construct their own rather than sharing.

pub mod error;
pub mod params;
pub mod traits;
pub mod util;

pub use error::CryptoError;
pub use params::CipherParameters;
pub use traits::{BlockCipher, Digest, Mac, Padding, StreamCipher};
