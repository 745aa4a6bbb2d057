//! Message authentication constructions
//!
//! Two [`Mac`](ashlar_core::traits::Mac) implementations over the core
//! primitive contracts: [`HmacMac`] wraps any incremental digest in the
//! standard inner/outer-pad construction, and [`KeystreamMac`] derives
//! a tag from a keyed keystream generator mixed over the message.
//!
//! Both auto-reset after a successful finalize, so one keyed instance
//! authenticates a sequence of messages without re-keying.

pub mod hmac;
pub mod keystream;

pub use hmac::HmacMac;
pub use keystream::KeystreamMac;
