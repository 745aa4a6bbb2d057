//! Consumption contracts for primitives and constructions
//!
//! Buffer-handling contract shared by every trait here: `(buf, off)`
//! pairs address `buf[off..]`, and a buffer with less room after the
//! offset than the operation requires is a violated precondition (panic),
//! except where a method returns `Result` and documents otherwise.

use crate::error::CryptoError;
use crate::params::CipherParameters;

/// A keyed block transform: encrypts or decrypts exactly one block at a
/// time with no chaining of its own.
pub trait BlockCipher {
    /// Human-readable algorithm name, e.g. `"SM4"` or `"SM4/CBC"`.
    fn algorithm_name(&self) -> String;

    /// Block size in bytes this cipher processes per call.
    fn block_size(&self) -> usize;

    /// Key (or re-key) the cipher for the given direction.
    ///
    /// Panics on configuration errors: wrong key/IV length, a parameter
    /// variant this cipher does not accept, or an IV-only reinit that
    /// changes direction.
    fn init(&mut self, for_encryption: bool, params: &CipherParameters);

    /// Transform one block from `input[in_off..]` into `output[out_off..]`.
    ///
    /// Returns the number of bytes written (always one block). Panics if
    /// either buffer holds less than one block past its offset, or if the
    /// cipher was never initialized.
    fn process_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize;

    /// Return the cipher to its state immediately after the last `init`.
    fn reset(&mut self);
}

/// A keyed keystream generator consumed as a byte-stream XOR primitive.
pub trait StreamCipher {
    /// Human-readable algorithm name.
    fn algorithm_name(&self) -> String;

    /// Key the generator. Unlike [`BlockCipher::init`], rejected keying
    /// material is reported as a value since stream engines sit behind
    /// this contract's `Result`-based surface.
    fn init(
        &mut self,
        for_encryption: bool,
        params: &CipherParameters,
    ) -> Result<(), CryptoError>;

    /// XOR `len` keystream bytes into `input[in_off..in_off + len]`,
    /// writing the result at `output[out_off..]`. Returns bytes written.
    fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError>;

    /// XOR a single byte against the next keystream byte.
    fn return_byte(&mut self, b: u8) -> Result<u8, CryptoError>;

    /// Rewind the keystream to its state immediately after the last `init`.
    fn reset(&mut self);
}

/// An incremental hash with a known digest size.
pub trait Digest {
    /// Human-readable algorithm name.
    fn algorithm_name(&self) -> String;

    /// Digest output size in bytes.
    fn digest_size(&self) -> usize;

    /// The digest's true internal block length in bytes, if it advertises
    /// one. Consumers that need a block length (HMAC) fall back to 64
    /// when this returns `None`.
    fn block_length(&self) -> Option<usize> {
        None
    }

    /// Absorb a single byte.
    fn update(&mut self, b: u8);

    /// Absorb `data[off..off + len]`.
    fn block_update(&mut self, data: &[u8], off: usize, len: usize);

    /// Finalize into `out[out_off..]`, returning the digest size. The
    /// digest is reset and immediately reusable afterwards. Panics if the
    /// output buffer is too short.
    fn do_final(&mut self, out: &mut [u8], out_off: usize) -> usize;

    /// Discard absorbed input and return to the initial state.
    fn reset(&mut self);
}

/// A message authentication code construction.
pub trait Mac {
    /// Human-readable algorithm name.
    fn algorithm_name(&self) -> String;

    /// MAC output size in bytes.
    fn mac_size(&self) -> usize;

    /// Key the MAC. Panics on a parameter variant this MAC does not
    /// accept; key material the underlying primitive rejects surfaces as
    /// an error.
    fn init(&mut self, params: &CipherParameters) -> Result<(), CryptoError>;

    /// Absorb a single message byte.
    fn update(&mut self, b: u8) -> Result<(), CryptoError>;

    /// Absorb `data[off..off + len]`.
    fn block_update(&mut self, data: &[u8], off: usize, len: usize) -> Result<(), CryptoError>;

    /// Finalize into `out[out_off..]`, returning the MAC size. The
    /// instance is immediately reusable for a fresh message afterwards
    /// without an explicit [`reset`](Self::reset).
    fn do_final(&mut self, out: &mut [u8], out_off: usize) -> Result<usize, CryptoError>;

    /// Discard the accumulated message, keeping the key.
    fn reset(&mut self);
}

/// A block padding strategy consumed by the buffered cipher.
pub trait Padding {
    /// Human-readable padding scheme name.
    fn padding_name(&self) -> String;

    /// Pad `buf[offset..]` in place, returning the number of pad bytes
    /// written. `offset` is the count of message bytes already in `buf`.
    fn add_padding(&self, buf: &mut [u8], offset: usize) -> usize;

    /// Count the trailing pad bytes of a decrypted block, or report a
    /// corrupted pad. Must examine the block without data-dependent
    /// early exits.
    fn pad_count(&self, buf: &[u8]) -> Result<usize, CryptoError>;
}
