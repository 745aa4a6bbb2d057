//! Padding-aware buffered block cipher
//!
//! Accumulates arbitrary-length writes into whole blocks for an
//! underlying mode and applies a padding scheme at finalize. The last
//! full block is always held back: when encrypting it may still be
//! followed by more data, and when decrypting it is the only block that
//! can carry padding, so neither is released until `do_final`.

use ashlar_core::error::CryptoError;
use ashlar_core::params::CipherParameters;
use ashlar_core::traits::{BlockCipher, Padding};
use ashlar_core::util::check_buffer;
use tracing::trace;
use zeroize::Zeroize;

/// Buffered cipher applying `P` over the block cipher (or mode) `C`.
pub struct PaddedBlockCipher<C: BlockCipher, P: Padding> {
    cipher: C,
    padding: P,
    buf: Vec<u8>,
    buf_off: usize,
    for_encryption: bool,
    initialized: bool,
}

impl<C: BlockCipher, P: Padding> PaddedBlockCipher<C, P> {
    /// Wrap `cipher` with the padding scheme `padding`.
    pub fn new(cipher: C, padding: P) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            padding,
            buf: vec![0; block_size],
            buf_off: 0,
            for_encryption: false,
            initialized: false,
        }
    }

    /// Human-readable algorithm name of the underlying cipher.
    pub fn algorithm_name(&self) -> String {
        self.cipher.algorithm_name()
    }

    /// Block size of the underlying cipher.
    pub fn block_size(&self) -> usize {
        self.cipher.block_size()
    }

    /// Key the underlying cipher and clear any buffered data.
    pub fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        self.for_encryption = for_encryption;
        self.cipher.init(for_encryption, params);
        self.initialized = true;
        self.reset();
        trace!(
            cipher = %self.cipher.algorithm_name(),
            encrypt = for_encryption,
            "buffered cipher initialized"
        );
    }

    /// Bytes a `process_bytes` call with `len` input bytes will emit.
    pub fn get_update_output_size(&self, len: usize) -> usize {
        let total = len + self.buf_off;
        let block_size = self.buf.len();
        let leftover = total % block_size;
        if leftover == 0 {
            // A final whole block is held back for do_final.
            total.saturating_sub(block_size)
        } else {
            total - leftover
        }
    }

    /// Bytes `process_bytes(len)` followed by `do_final` will emit in
    /// total. For decryption this is an upper bound: padding removal can
    /// only shrink the result.
    pub fn get_output_size(&self, len: usize) -> usize {
        let total = len + self.buf_off;
        let block_size = self.buf.len();
        if self.for_encryption {
            total - total % block_size + block_size
        } else {
            total - total % block_size
        }
    }

    /// Process one byte, emitting a block into `output[out_off..]` when
    /// one completes. Returns the bytes written (0 or the block size).
    pub fn process_byte(
        &mut self,
        b: u8,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError> {
        assert!(self.initialized, "buffered cipher used before init");

        let mut written = 0;
        if self.buf_off == self.buf.len() {
            let block_size = self.buf.len();
            if output.len() < out_off + block_size {
                return Err(CryptoError::OutputTooShort {
                    needed: block_size,
                    available: output.len().saturating_sub(out_off),
                });
            }
            written = self.cipher.process_block(&self.buf, 0, output, out_off);
            self.buf_off = 0;
        }
        self.buf[self.buf_off] = b;
        self.buf_off += 1;
        Ok(written)
    }

    /// Process `len` bytes from `input[in_off..]` into
    /// `output[out_off..]`, returning the bytes written.
    pub fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError> {
        assert!(self.initialized, "buffered cipher used before init");
        check_buffer(input.len(), in_off, len, "input buffer");

        let will_write = self.get_update_output_size(len);
        if output.len() < out_off + will_write {
            return Err(CryptoError::OutputTooShort {
                needed: will_write,
                available: output.len().saturating_sub(out_off),
            });
        }

        let block_size = self.buf.len();
        let gap = block_size - self.buf_off;
        let mut written = 0;
        let mut in_off = in_off;
        let mut len = len;

        // Only drain the buffer once more input exists to refill it;
        // exactly filling it keeps the block held back.
        if len > gap {
            self.buf[self.buf_off..].copy_from_slice(&input[in_off..in_off + gap]);
            written += self.cipher.process_block(&self.buf, 0, output, out_off);
            self.buf_off = 0;
            in_off += gap;
            len -= gap;

            while len > block_size {
                written +=
                    self.cipher.process_block(input, in_off, output, out_off + written);
                in_off += block_size;
                len -= block_size;
            }
        }

        self.buf[self.buf_off..self.buf_off + len].copy_from_slice(&input[in_off..in_off + len]);
        self.buf_off += len;
        Ok(written)
    }

    /// Flush the held-back data.
    ///
    /// Encrypting: pads the buffered tail (adding a whole pad block when
    /// the input was block-aligned) and emits the final ciphertext.
    /// Decrypting: deciphers the held-back block, strips its padding and
    /// emits the remainder; a ragged tail is
    /// [`CryptoError::NotBlockAligned`] and a bad pad is
    /// [`CryptoError::PadCorrupted`]. The buffer is cleared on every
    /// path, success or failure.
    pub fn do_final(
        &mut self,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError> {
        assert!(self.initialized, "buffered cipher used before init");

        let result = if self.for_encryption {
            self.finish_encrypt(output, out_off)
        } else {
            self.finish_decrypt(output, out_off)
        };
        self.reset();
        result
    }

    fn finish_encrypt(
        &mut self,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError> {
        let block_size = self.buf.len();
        let needed = if self.buf_off == block_size { 2 * block_size } else { block_size };
        if output.len() < out_off + needed {
            return Err(CryptoError::OutputTooShort {
                needed,
                available: output.len().saturating_sub(out_off),
            });
        }

        let mut written = 0;
        if self.buf_off == block_size {
            written = self.cipher.process_block(&self.buf, 0, output, out_off);
            self.buf_off = 0;
        }

        self.padding.add_padding(&mut self.buf, self.buf_off);
        written += self.cipher.process_block(&self.buf, 0, output, out_off + written);
        Ok(written)
    }

    fn finish_decrypt(
        &mut self,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError> {
        let block_size = self.buf.len();
        if self.buf_off != block_size {
            return Err(CryptoError::NotBlockAligned {
                length: self.buf_off,
                block_size,
            });
        }

        let mut plain = vec![0u8; block_size];
        self.cipher.process_block(&self.buf, 0, &mut plain, 0);

        let pad = self.padding.pad_count(&plain)?;
        let keep = block_size - pad;
        if output.len() < out_off + keep {
            plain.zeroize();
            return Err(CryptoError::OutputTooShort {
                needed: keep,
                available: output.len().saturating_sub(out_off),
            });
        }
        output[out_off..out_off + keep].copy_from_slice(&plain[..keep]);
        plain.zeroize();
        Ok(keep)
    }

    /// Discard buffered data and reset the underlying cipher's chaining
    /// state.
    pub fn reset(&mut self) {
        self.buf.as_mut_slice().zeroize();
        self.buf_off = 0;
        self.cipher.reset();
    }
}

impl<C: BlockCipher, P: Padding> Drop for PaddedBlockCipher<C, P> {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}
