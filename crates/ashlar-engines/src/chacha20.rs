//! ChaCha20 keystream generator (RFC 8439)
//!
//! Consumed by the pipeline strictly as a keyed byte-stream XOR
//! primitive behind the [`StreamCipher`] contract. 32-byte key, 12-byte
//! nonce, 32-bit block counter starting at zero.

use ashlar_core::error::CryptoError;
use ashlar_core::params::CipherParameters;
use ashlar_core::traits::StreamCipher;
use ashlar_core::util::check_buffer;
use zeroize::Zeroize;

/// ChaCha20 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// ChaCha20 nonce size in bytes.
pub const NONCE_SIZE: usize = 12;

const BLOCK_BYTES: usize = 64;

// "expand 32-byte k"
const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(12);
    state[a] = state[a].wrapping_add(state[b]);
    state[d] = (state[d] ^ state[a]).rotate_left(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_left(7);
}

/// ChaCha20 keystream generator.
pub struct ChaCha20Keystream {
    key: [u32; 8],
    nonce: [u32; 3],
    counter: u32,
    block: [u8; BLOCK_BYTES],
    // BLOCK_BYTES means "no keystream bytes available".
    block_pos: usize,
    initialized: bool,
}

impl ChaCha20Keystream {
    /// Create an unkeyed generator; call [`StreamCipher::init`] before use.
    pub fn new() -> Self {
        Self {
            key: [0; 8],
            nonce: [0; 3],
            counter: 0,
            block: [0; BLOCK_BYTES],
            block_pos: BLOCK_BYTES,
            initialized: false,
        }
    }

    fn set_key(&mut self, key: &[u8], nonce: &[u8]) -> Result<(), CryptoError> {
        if key.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength { expected: KEY_SIZE, actual: key.len() });
        }
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: nonce.len(),
            });
        }

        for i in 0..8 {
            let mut word = [0u8; 4];
            word.copy_from_slice(&key[4 * i..4 * i + 4]);
            self.key[i] = u32::from_le_bytes(word);
        }
        for i in 0..3 {
            let mut word = [0u8; 4];
            word.copy_from_slice(&nonce[4 * i..4 * i + 4]);
            self.nonce[i] = u32::from_le_bytes(word);
        }
        Ok(())
    }

    fn set_nonce(&mut self, nonce: &[u8]) -> Result<(), CryptoError> {
        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: nonce.len(),
            });
        }
        for i in 0..3 {
            let mut word = [0u8; 4];
            word.copy_from_slice(&nonce[4 * i..4 * i + 4]);
            self.nonce[i] = u32::from_le_bytes(word);
        }
        Ok(())
    }

    fn generate_block(&mut self) {
        let mut input = [0u32; 16];
        input[0..4].copy_from_slice(&SIGMA);
        input[4..12].copy_from_slice(&self.key);
        input[12] = self.counter;
        input[13..16].copy_from_slice(&self.nonce);

        let mut working = input;
        for _ in 0..10 {
            quarter_round(&mut working, 0, 4, 8, 12);
            quarter_round(&mut working, 1, 5, 9, 13);
            quarter_round(&mut working, 2, 6, 10, 14);
            quarter_round(&mut working, 3, 7, 11, 15);
            quarter_round(&mut working, 0, 5, 10, 15);
            quarter_round(&mut working, 1, 6, 11, 12);
            quarter_round(&mut working, 2, 7, 8, 13);
            quarter_round(&mut working, 3, 4, 9, 14);
        }

        for i in 0..16 {
            let word = working[i].wrapping_add(input[i]);
            self.block[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
        }

        self.counter = self.counter.wrapping_add(1);
        self.block_pos = 0;
    }

    fn next_keystream_byte(&mut self) -> u8 {
        if self.block_pos == BLOCK_BYTES {
            self.generate_block();
        }
        let b = self.block[self.block_pos];
        self.block_pos += 1;
        b
    }
}

impl Default for ChaCha20Keystream {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamCipher for ChaCha20Keystream {
    fn algorithm_name(&self) -> String {
        "ChaCha20".to_string()
    }

    fn init(
        &mut self,
        _for_encryption: bool,
        params: &CipherParameters,
    ) -> Result<(), CryptoError> {
        match params {
            CipherParameters::KeyWithIv { key, iv } => self.set_key(key, iv)?,
            CipherParameters::IvOnly { iv } => {
                if !self.initialized {
                    return Err(CryptoError::NotInitialized { what: "ChaCha20 keystream" });
                }
                self.set_nonce(iv)?;
            }
            CipherParameters::Key { .. } => {
                return Err(CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual: 0 });
            }
            CipherParameters::Aead { .. } => {
                panic!("ChaCha20 keystream cannot use AEAD parameters")
            }
        }

        self.initialized = true;
        self.reset();
        Ok(())
    }

    fn process_bytes(
        &mut self,
        input: &[u8],
        in_off: usize,
        len: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> Result<usize, CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "ChaCha20 keystream" });
        }
        check_buffer(input.len(), in_off, len, "input buffer");
        check_buffer(output.len(), out_off, len, "output buffer");

        for i in 0..len {
            output[out_off + i] = input[in_off + i] ^ self.next_keystream_byte();
        }
        Ok(len)
    }

    fn return_byte(&mut self, b: u8) -> Result<u8, CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "ChaCha20 keystream" });
        }
        Ok(b ^ self.next_keystream_byte())
    }

    fn reset(&mut self) {
        self.counter = 0;
        self.block.zeroize();
        self.block_pos = BLOCK_BYTES;
    }
}

impl Drop for ChaCha20Keystream {
    fn drop(&mut self) {
        self.key.zeroize();
        self.block.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::{ChaCha20Keystream, KEY_SIZE, NONCE_SIZE};
    use ashlar_core::error::CryptoError;
    use ashlar_core::params::CipherParameters;
    use ashlar_core::traits::StreamCipher;

    fn keyed(key: &[u8], nonce: &[u8]) -> ChaCha20Keystream {
        let mut generator = ChaCha20Keystream::new();
        generator.init(true, &CipherParameters::key_with_iv(key, nonce)).unwrap();
        generator
    }

    // RFC 8439 keystream for the all-zero key and nonce, block 0.
    #[test]
    fn zero_key_keystream_vector() {
        let mut generator = keyed(&[0u8; KEY_SIZE], &[0u8; NONCE_SIZE]);
        let zeros = [0u8; 32];
        let mut out = [0u8; 32];
        generator.process_bytes(&zeros, 0, 32, &mut out, 0).unwrap();
        assert_eq!(
            hex::encode(out),
            "76b8e0ada0f13d90405d6ae55386bd28bdd219b8a08ded1aa836efcc8b770dc7"
        );
    }

    #[test]
    fn xor_round_trips() {
        let key = [7u8; KEY_SIZE];
        let nonce = [9u8; NONCE_SIZE];
        let plaintext = b"attack at dawn, retreat at dusk";

        let mut enc = keyed(&key, &nonce);
        let mut dec = keyed(&key, &nonce);

        let mut ct = vec![0u8; plaintext.len()];
        let mut pt = vec![0u8; plaintext.len()];
        enc.process_bytes(plaintext, 0, plaintext.len(), &mut ct, 0).unwrap();
        dec.process_bytes(&ct, 0, ct.len(), &mut pt, 0).unwrap();

        assert_eq!(pt, plaintext);
    }

    #[test]
    fn return_byte_matches_process_bytes() {
        let key = [3u8; KEY_SIZE];
        let nonce = [5u8; NONCE_SIZE];
        let data = [0xAAu8; 80];

        let mut bulk = keyed(&key, &nonce);
        let mut bytewise = keyed(&key, &nonce);

        let mut expected = [0u8; 80];
        bulk.process_bytes(&data, 0, 80, &mut expected, 0).unwrap();

        for (i, &b) in data.iter().enumerate() {
            assert_eq!(bytewise.return_byte(b).unwrap(), expected[i]);
        }
    }

    #[test]
    fn reset_rewinds_keystream() {
        let mut generator = keyed(&[1u8; KEY_SIZE], &[2u8; NONCE_SIZE]);
        let zeros = [0u8; 100];
        let mut first = [0u8; 100];
        let mut second = [0u8; 100];

        generator.process_bytes(&zeros, 0, 100, &mut first, 0).unwrap();
        generator.reset();
        generator.process_bytes(&zeros, 0, 100, &mut second, 0).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn wrong_key_length_is_an_error() {
        let mut generator = ChaCha20Keystream::new();
        let result = generator.init(true, &CipherParameters::key_with_iv(&[0u8; 16], &[0u8; 12]));
        assert_eq!(
            result,
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 16 })
        );
    }

    #[test]
    fn unkeyed_use_is_an_error() {
        let mut generator = ChaCha20Keystream::new();
        assert_eq!(
            generator.return_byte(0),
            Err(CryptoError::NotInitialized { what: "ChaCha20 keystream" })
        );
    }
}
