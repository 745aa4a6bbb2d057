//! Block cipher modes of operation
//!
//! Turns a raw keyed block transform into a usable cipher. Each wrapper
//! owns its inner [`BlockCipher`] exclusively and adds the chaining,
//! feedback or counter state the mode calls for:
//!
//! ```text
//! caller
//!   │
//!   ▼
//! mode wrapper (CBC / CFB / OFB / CTR / ECB / GCM)
//!   │  chaining register, cursor, counters
//!   ▼
//! block cipher engine ── one 16-byte transform per call
//! ```
//!
//! Data flows one direction only; no primitive calls back into a
//! wrapper. [`PaddedBlockCipher`] adapts a block-aligned mode to
//! arbitrary-length byte streams via a [`Padding`] strategy, and
//! [`GcmCipher`] composes counter-mode encryption with GF(2^128)
//! polynomial hashing into an authenticated construction.
//!
//! # Error propagation of the classic modes
//!
//! - CBC: a corrupted ciphertext block garbles that block and the next,
//!   nothing further.
//! - CFB: a corrupted byte garbles its own position and the following
//!   feedback-register span.
//! - OFB/CTR: a corrupted byte garbles exactly its own position.
//! - ECB: no chaining at all; identical plaintext blocks leak as
//!   identical ciphertext blocks. Kept for legacy data and as a
//!   negative-test fixture only.
//!
//! [`BlockCipher`]: ashlar_core::BlockCipher
//! [`Padding`]: ashlar_core::Padding

pub mod buffered;
pub mod cbc;
pub mod cfb;
pub mod ctr;
pub mod ecb;
pub mod gcm;
pub mod gf128;
pub mod ofb;
pub mod padding;

pub use buffered::PaddedBlockCipher;
pub use cbc::CbcMode;
pub use cfb::CfbMode;
pub use ctr::CtrMode;
pub use ecb::EcbMode;
pub use gcm::GcmCipher;
pub use ofb::OfbMode;
pub use padding::Pkcs7Padding;
