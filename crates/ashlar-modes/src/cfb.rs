//! Cipher Feedback mode
//!
//! Keystream comes from encrypting a feedback register; ciphertext bytes
//! are shifted back into the register, making the mode
//! self-synchronizing. The inner cipher always runs in the encrypt
//! direction, for decryption too.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_core::util::check_buffer;
use tracing::trace;
use zeroize::Zeroize;

/// CFB wrapper with a configurable feedback width.
///
/// [`BlockCipher::block_size`] reports the feedback width in bytes; the
/// wrapper consumes and produces data in units of that width.
pub struct CfbMode<C: BlockCipher> {
    cipher: C,
    cipher_block_size: usize,
    feedback_bytes: usize,
    iv: Vec<u8>,
    register: Vec<u8>,
    keystream: Vec<u8>,
    // Ciphertext bytes produced since the last register shift.
    feedback: Vec<u8>,
    cursor: usize,
    for_encryption: bool,
    initialized: bool,
}

impl<C: BlockCipher> CfbMode<C> {
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
            "CFB feedback size must be a positive multiple of 8 bits up to {} bits, got {}",
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
            feedback: vec![0; feedback_bytes],
            cursor: 0,
            for_encryption: false,
            initialized: false,
        }
    }

    fn set_iv(&mut self, iv: &[u8]) {
        let bs = self.cipher_block_size;
        assert!(
            iv.len() <= bs,
            "CFB IV cannot exceed the cipher block size ({bs} bytes), got {}",
            iv.len()
        );
        // Short IVs sit at the low end of the register, zero-prefixed.
        self.iv.as_mut_slice().zeroize();
        self.iv[bs - iv.len()..].copy_from_slice(iv);
    }

    /// Process one byte through the feedback state machine.
    pub fn process_byte(&mut self, b: u8) -> u8 {
        assert!(self.initialized, "CFB mode used before init");

        if self.cursor == 0 {
            self.cipher.process_block(&self.register, 0, &mut self.keystream, 0);
        }

        let out = self.keystream[self.cursor] ^ b;
        let ciphertext_byte = if self.for_encryption { out } else { b };
        self.feedback[self.cursor] = ciphertext_byte;
        self.cursor += 1;

        if self.cursor == self.feedback_bytes {
            let bs = self.cipher_block_size;
            self.register.copy_within(self.feedback_bytes.., 0);
            self.register[bs - self.feedback_bytes..].copy_from_slice(&self.feedback);
            self.cursor = 0;
        }

        out
    }
}

impl<C: BlockCipher> BlockCipher for CfbMode<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/CFB{}", self.cipher.algorithm_name(), self.feedback_bytes * 8)
    }

    fn block_size(&self) -> usize {
        self.feedback_bytes
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        match params {
            CipherParameters::KeyWithIv { key, iv } => {
                self.set_iv(iv);
                self.for_encryption = for_encryption;
                // Feedback modes never run the inner cipher backwards.
                self.cipher.init(true, &CipherParameters::key(key));
            }
            CipherParameters::Key { key } => {
                self.iv.as_mut_slice().zeroize();
                self.for_encryption = for_encryption;
                self.cipher.init(true, &CipherParameters::key(key));
            }
            CipherParameters::IvOnly { iv } => {
                assert!(
                    self.initialized,
                    "CFB IV-only reinit requires a previously keyed cipher"
                );
                assert!(
                    self.for_encryption == for_encryption,
                    "CFB IV-only reinit cannot change the cipher direction"
                );
                self.set_iv(iv);
            }
            CipherParameters::Aead { .. } => panic!("CFB mode cannot use AEAD parameters"),
        }

        self.initialized = true;
        self.reset();
        trace!(mode = "CFB", encrypt = for_encryption, "cipher initialized");
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
        self.feedback.as_mut_slice().zeroize();
        self.cursor = 0;
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for CfbMode<C> {
    fn drop(&mut self) {
        self.register.zeroize();
        self.keystream.zeroize();
        self.feedback.zeroize();
    }
}
