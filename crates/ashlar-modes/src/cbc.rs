//! Cipher Block Chaining mode
//!
//! Each plaintext block is XORed into a chaining register before
//! encryption; decryption XORs the previous ciphertext block back out.
//! A corrupted ciphertext block therefore affects that block and the one
//! after it, and no more.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_core::util::{check_buffer, xor_in_place};
use tracing::trace;
use zeroize::Zeroize;

/// CBC wrapper around a block cipher.
pub struct CbcMode<C: BlockCipher> {
    cipher: C,
    block_size: usize,
    iv: Vec<u8>,
    register: Vec<u8>,
    // Decrypt-side scratch holding the ciphertext block that becomes the
    // next register value.
    register_next: Vec<u8>,
    for_encryption: bool,
    initialized: bool,
}

impl<C: BlockCipher> CbcMode<C> {
    /// Wrap `cipher` in CBC mode. The wrapper takes exclusive ownership.
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            block_size,
            iv: vec![0; block_size],
            register: vec![0; block_size],
            register_next: vec![0; block_size],
            for_encryption: false,
            initialized: false,
        }
    }

    fn set_iv(&mut self, iv: &[u8]) {
        assert!(
            iv.len() == self.block_size,
            "CBC requires an IV of exactly one block ({} bytes), got {}",
            self.block_size,
            iv.len()
        );
        self.iv.copy_from_slice(iv);
    }

    fn encrypt_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        let bs = self.block_size;
        xor_in_place(&mut self.register, &input[in_off..in_off + bs]);
        self.cipher.process_block(&self.register, 0, output, out_off);
        self.register.copy_from_slice(&output[out_off..out_off + bs]);
        bs
    }

    fn decrypt_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        let bs = self.block_size;
        self.register_next.copy_from_slice(&input[in_off..in_off + bs]);
        self.cipher.process_block(input, in_off, output, out_off);
        xor_in_place(&mut output[out_off..out_off + bs], &self.register);
        std::mem::swap(&mut self.register, &mut self.register_next);
        bs
    }
}

impl<C: BlockCipher> BlockCipher for CbcMode<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/CBC", self.cipher.algorithm_name())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        match params {
            CipherParameters::KeyWithIv { key, iv } => {
                self.set_iv(iv);
                self.for_encryption = for_encryption;
                self.cipher.init(for_encryption, &CipherParameters::key(key));
            }
            CipherParameters::Key { key } => {
                self.iv.as_mut_slice().zeroize();
                self.for_encryption = for_encryption;
                self.cipher.init(for_encryption, &CipherParameters::key(key));
            }
            CipherParameters::IvOnly { iv } => {
                assert!(
                    self.initialized,
                    "CBC IV-only reinit requires a previously keyed cipher"
                );
                assert!(
                    self.for_encryption == for_encryption,
                    "CBC IV-only reinit cannot change the cipher direction"
                );
                self.set_iv(iv);
            }
            CipherParameters::Aead { .. } => panic!("CBC mode cannot use AEAD parameters"),
        }

        self.initialized = true;
        self.reset();
        trace!(
            mode = "CBC",
            encrypt = for_encryption,
            "cipher initialized"
        );
    }

    fn process_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        assert!(self.initialized, "CBC mode used before init");
        check_buffer(input.len(), in_off, self.block_size, "input buffer");
        check_buffer(output.len(), out_off, self.block_size, "output buffer");

        if self.for_encryption {
            self.encrypt_block(input, in_off, output, out_off)
        } else {
            self.decrypt_block(input, in_off, output, out_off)
        }
    }

    fn reset(&mut self) {
        self.register.copy_from_slice(&self.iv);
        self.register_next.as_mut_slice().zeroize();
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for CbcMode<C> {
    fn drop(&mut self) {
        self.register.zeroize();
        self.register_next.zeroize();
    }
}
