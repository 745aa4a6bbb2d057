//! Output Feedback mode
//!
//! Like CFB, but the register is fed from the keystream itself rather
//! than the ciphertext, so the keystream is independent of the data and
//! a corrupted ciphertext byte garbles exactly one plaintext byte.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_core::util::check_buffer;
use tracing::trace;
use zeroize::Zeroize;

/// OFB wrapper with a configurable feedback width.
pub struct OfbMode<C: BlockCipher> {
    cipher: C,
    cipher_block_size: usize,
    feedback_bytes: usize,
    iv: Vec<u8>,
    register: Vec<u8>,
    keystream: Vec<u8>,
    cursor: usize,
    initialized: bool,
}

impl<C: BlockCipher> OfbMode<C> {
    /// Wrap `cipher` with a feedback width of `feedback_bits`.
    ///
    /// The width must be a positive multiple of 8 no larger than the
    /// cipher's block size; anything else is a fatal configuration
    /// error.
    pub fn new(cipher: C, feedback_bits: usize) -> Self {
        let cipher_block_size = cipher.block_size();
        assert!(
            feedback_bits > 0
                && feedback_bits % 8 == 0
                && feedback_bits <= cipher_block_size * 8,
            "OFB feedback size must be a positive multiple of 8 bits up to {} bits, got {}",
            cipher_block_size * 8,
            feedback_bits
        );
        let feedback_bytes = feedback_bits / 8;
        Self {
            cipher,
            cipher_block_size,
            feedback_bytes,
            iv: vec![0; cipher_block_size],
            register: vec![0; cipher_block_size],
            keystream: vec![0; cipher_block_size],
            cursor: 0,
            initialized: false,
        }
    }

    fn set_iv(&mut self, iv: &[u8]) {
        let bs = self.cipher_block_size;
        assert!(
            iv.len() <= bs,
            "OFB IV cannot exceed the cipher block size ({bs} bytes), got {}",
            iv.len()
        );
        self.iv.as_mut_slice().zeroize();
        self.iv[bs - iv.len()..].copy_from_slice(iv);
    }

    /// Process one byte through the feedback state machine.
    ///
    /// Encryption and decryption are the same operation in OFB.
    pub fn process_byte(&mut self, b: u8) -> u8 {
        assert!(self.initialized, "OFB mode used before init");

        if self.cursor == 0 {
            self.cipher.process_block(&self.register, 0, &mut self.keystream, 0);
        }

        let out = self.keystream[self.cursor] ^ b;
        self.cursor += 1;

        if self.cursor == self.feedback_bytes {
            let bs = self.cipher_block_size;
            let fb = self.feedback_bytes;
            self.register.copy_within(fb.., 0);
            // Keystream feedback: data never enters the register.
            let (head, _) = self.keystream.split_at(fb);
            self.register[bs - fb..].copy_from_slice(head);
            self.cursor = 0;
        }

        out
    }
}

impl<C: BlockCipher> BlockCipher for OfbMode<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/OFB{}", self.cipher.algorithm_name(), self.feedback_bytes * 8)
    }

    fn block_size(&self) -> usize {
        self.feedback_bytes
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        match params {
            CipherParameters::KeyWithIv { key, iv } => {
                self.set_iv(iv);
                // Keystream is direction-independent; the inner cipher
                // always encrypts.
                self.cipher.init(true, &CipherParameters::key(key));
            }
            CipherParameters::Key { key } => {
                self.iv.as_mut_slice().zeroize();
                self.cipher.init(true, &CipherParameters::key(key));
            }
            CipherParameters::IvOnly { iv } => {
                assert!(
                    self.initialized,
                    "OFB IV-only reinit requires a previously keyed cipher"
                );
                self.set_iv(iv);
            }
            CipherParameters::Aead { .. } => panic!("OFB mode cannot use AEAD parameters"),
        }

        self.initialized = true;
        self.reset();
        trace!(mode = "OFB", encrypt = for_encryption, "cipher initialized");
    }

    fn process_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        check_buffer(input.len(), in_off, self.feedback_bytes, "input buffer");
        check_buffer(output.len(), out_off, self.feedback_bytes, "output buffer");

        for i in 0..self.feedback_bytes {
            output[out_off + i] = self.process_byte(input[in_off + i]);
        }
        self.feedback_bytes
    }

    fn reset(&mut self) {
        self.register.copy_from_slice(&self.iv);
        self.keystream.as_mut_slice().zeroize();
        self.cursor = 0;
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for OfbMode<C> {
    fn drop(&mut self) {
        self.register.zeroize();
        self.keystream.zeroize();
    }
}
