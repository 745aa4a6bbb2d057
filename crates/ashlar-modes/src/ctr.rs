//! Counter mode
//!
//! The nonce seeds the front of a counter block; the free low-order
//! bytes count up big-endian and each encrypted counter block becomes
//! keystream. Supports whole-block and byte-wise streaming through the
//! same cursor.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_core::util::check_buffer;
use tracing::trace;
use zeroize::Zeroize;

/// Counter-mode wrapper around a block cipher.
///
/// The nonce must leave at most `min(8, block_size / 2)` free counter
/// bytes so the counter space stays meaningfully bounded; a shorter
/// nonce is a fatal configuration error.
pub struct CtrMode<C: BlockCipher> {
    cipher: C,
    block_size: usize,
    nonce: Vec<u8>,
    counter: Vec<u8>,
    keystream: Vec<u8>,
    cursor: usize,
    initialized: bool,
}

impl<C: BlockCipher> CtrMode<C> {
    /// Wrap `cipher` in counter mode.
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        Self {
            cipher,
            block_size,
            nonce: Vec::new(),
            counter: vec![0; block_size],
            keystream: vec![0; block_size],
            cursor: 0,
            initialized: false,
        }
    }

    fn set_nonce(&mut self, nonce: &[u8]) {
        let bs = self.block_size;
        let max_counter_bytes = 8.min(bs / 2);
        assert!(
            nonce.len() <= bs,
            "CTR nonce cannot exceed the cipher block size ({bs} bytes), got {}",
            nonce.len()
        );
        assert!(
            bs - nonce.len() <= max_counter_bytes,
            "CTR nonce must be at least {} bytes for a {bs}-byte block, got {}",
            bs - max_counter_bytes,
            nonce.len()
        );
        self.nonce = nonce.to_vec();
    }

    // Big-endian increment, rightmost byte first with carry.
    fn increment_counter(&mut self) {
        for i in (0..self.block_size).rev() {
            self.counter[i] = self.counter[i].wrapping_add(1);
            if self.counter[i] != 0 {
                break;
            }
        }
    }

    // The nonce-derived bytes never participate in counting. If they no
    // longer match the seeded nonce, either the caller reached into the
    // counter or the free counter space was exhausted; both are fatal.
    fn check_counter(&self) {
        if self.nonce.len() < self.block_size {
            assert!(
                self.counter[..self.nonce.len()] == self.nonce[..],
                "CTR counter drifted into the nonce bytes: state corrupted or counter exhausted"
            );
        }
    }

    /// Process one byte through the counter keystream.
    ///
    /// Encryption and decryption are the same operation in CTR.
    pub fn process_byte(&mut self, b: u8) -> u8 {
        assert!(self.initialized, "CTR mode used before init");

        if self.cursor == 0 {
            self.check_counter();
            self.cipher.process_block(&self.counter, 0, &mut self.keystream, 0);
        }

        let out = self.keystream[self.cursor] ^ b;
        self.cursor += 1;

        if self.cursor == self.block_size {
            self.cursor = 0;
            self.increment_counter();
        }

        out
    }

    /// Process `len` bytes from `input[in_off..]` into `output[out_off..]`.
    pub fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        check_buffer(input.len(), in_off, len, "input buffer");
        check_buffer(output.len(), out_off, len, "output buffer");

        for i in 0..len {
            output[out_off + i] = self.process_byte(input[in_off + i]);
        }
        len
    }
}

impl<C: BlockCipher> BlockCipher for CtrMode<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/CTR", self.cipher.algorithm_name())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        match params {
            CipherParameters::KeyWithIv { key, iv } => {
                self.set_nonce(iv);
                // Counter keystream only ever encrypts.
                self.cipher.init(true, &CipherParameters::key(key));
            }
            CipherParameters::IvOnly { iv } => {
                assert!(
                    self.initialized,
                    "CTR IV-only reinit requires a previously keyed cipher"
                );
                self.set_nonce(iv);
            }
            CipherParameters::Key { .. } => panic!("CTR mode requires a nonce"),
            CipherParameters::Aead { .. } => panic!("CTR mode cannot use AEAD parameters"),
        }

        self.initialized = true;
        self.reset();
        trace!(mode = "CTR", encrypt = for_encryption, "cipher initialized");
    }

    fn process_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        check_buffer(input.len(), in_off, self.block_size, "input buffer");
        check_buffer(output.len(), out_off, self.block_size, "output buffer");

        for i in 0..self.block_size {
            output[out_off + i] = self.process_byte(input[in_off + i]);
        }
        self.block_size
    }

    fn reset(&mut self) {
        self.counter.as_mut_slice().zeroize();
        self.counter[..self.nonce.len()].copy_from_slice(&self.nonce);
        self.keystream.as_mut_slice().zeroize();
        self.cursor = 0;
        self.cipher.reset();
    }
}

impl<C: BlockCipher> Drop for CtrMode<C> {
    fn drop(&mut self) {
        self.counter.zeroize();
        self.keystream.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::CtrMode;
    use ashlar_core::params::CipherParameters;
    use ashlar_core::traits::BlockCipher;
    use ashlar_engines::Sm4Engine;

    const KEY: [u8; 16] = [0x10; 16];
    const NONCE: [u8; 12] = [0x20; 12];

    fn keyed() -> CtrMode<Sm4Engine> {
        let mut mode = CtrMode::new(Sm4Engine::new());
        mode.init(true, &CipherParameters::key_with_iv(&KEY, &NONCE));
        mode
    }

    #[test]
    fn round_trips_across_block_boundaries() {
        let mut enc = keyed();
        let mut dec = keyed();

        let plaintext: Vec<u8> = (0..100).map(|i| (i * 3) as u8).collect();
        let mut ct = vec![0u8; 100];
        let mut pt = vec![0u8; 100];
        enc.process_bytes(&plaintext, 0, 100, &mut ct, 0);
        dec.process_bytes(&ct, 0, 100, &mut pt, 0);

        assert_eq!(pt, plaintext);
    }

    #[test]
    fn repeated_plaintext_diverges_by_counter_advance() {
        let mut enc = keyed();
        let plaintext = [0xAAu8; 32];
        let mut ct = [0u8; 32];
        enc.process_block(&plaintext, 0, &mut ct, 0);
        enc.process_block(&plaintext, 16, &mut ct, 16);
        assert_ne!(ct[..16], ct[16..]);
    }

    #[test]
    fn bytewise_matches_blockwise() {
        let mut bulk = keyed();
        let mut bytewise = keyed();

        let plaintext = [0x5Au8; 32];
        let mut expected = [0u8; 32];
        bulk.process_block(&plaintext, 0, &mut expected, 0);
        bulk.process_block(&plaintext, 16, &mut expected, 16);

        for (i, &b) in plaintext.iter().enumerate() {
            assert_eq!(bytewise.process_byte(b), expected[i]);
        }
    }

    #[test]
    fn full_block_nonce_is_accepted() {
        let mut mode = CtrMode::new(Sm4Engine::new());
        mode.init(true, &CipherParameters::key_with_iv(&KEY, &[0x7Fu8; 16]));
        let mut out = [0u8; 16];
        mode.process_block(&[0u8; 16], 0, &mut out, 0);
    }

    #[test]
    #[should_panic(expected = "CTR nonce must be at least")]
    fn short_nonce_is_fatal() {
        let mut mode = CtrMode::new(Sm4Engine::new());
        mode.init(true, &CipherParameters::key_with_iv(&KEY, &[0u8; 4]));
    }

    #[test]
    #[should_panic(expected = "CTR mode requires a nonce")]
    fn missing_nonce_is_fatal() {
        let mut mode = CtrMode::new(Sm4Engine::new());
        mode.init(true, &CipherParameters::key(&KEY));
    }
}
