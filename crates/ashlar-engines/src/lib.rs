//! Concrete leaf primitives for the Ashlar pipeline
//!
//! The cipher pipeline in `ashlar-modes` and the MAC constructions in
//! `ashlar-mac` consume primitives only through the narrow contracts in
//! `ashlar-core`. This crate provides the keyed leaves those contracts
//! are exercised with:
//!
//! - [`Sm4Engine`]: a 16-byte-block cipher ([`BlockCipher`])
//! - [`Sm3Digest`]: a 32-byte incremental digest ([`Digest`])
//! - [`ChaCha20Keystream`]: a byte-stream XOR generator ([`StreamCipher`])
//!
//! Each engine owns its expanded key material exclusively and zeroizes it
//! on drop.
//!
//! [`BlockCipher`]: ashlar_core::BlockCipher
//! [`Digest`]: ashlar_core::Digest
//! [`StreamCipher`]: ashlar_core::StreamCipher

pub mod chacha20;
pub mod sm3;
pub mod sm4;

pub use chacha20::ChaCha20Keystream;
pub use sm3::Sm3Digest;
pub use sm4::Sm4Engine;
