//! SM4 block cipher (GB/T 32907)
//!
//! 128-bit key, 16-byte block, 32 rounds of an unbalanced Feistel
//! network. Decryption runs the same round function with the round keys
//! in reverse order.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_core::util::check_buffer;
use zeroize::Zeroize;

/// SM4 block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// SM4 key size in bytes.
pub const KEY_SIZE: usize = 16;

const ROUNDS: usize = 32;

const SBOX: [u8; 256] = [
    0xd6, 0x90, 0xe9, 0xfe, 0xcc, 0xe1, 0x3d, 0xb7, 0x16, 0xb6, 0x14, 0xc2, 0x28, 0xfb, 0x2c,
    0x05, 0x2b, 0x67, 0x9a, 0x76, 0x2a, 0xbe, 0x04, 0xc3, 0xaa, 0x44, 0x13, 0x26, 0x49, 0x86,
    0x06, 0x99, 0x9c, 0x42, 0x50, 0xf4, 0x91, 0xef, 0x98, 0x7a, 0x33, 0x54, 0x0b, 0x43, 0xed,
    0xcf, 0xac, 0x62, 0xe4, 0xb3, 0x1c, 0xa9, 0xc9, 0x08, 0xe8, 0x95, 0x80, 0xdf, 0x94, 0xfa,
    0x75, 0x8f, 0x3f, 0xa6, 0x47, 0x07, 0xa7, 0xfc, 0xf3, 0x73, 0x17, 0xba, 0x83, 0x59, 0x3c,
    0x19, 0xe6, 0x85, 0x4f, 0xa8, 0x68, 0x6b, 0x81, 0xb2, 0x71, 0x64, 0xda, 0x8b, 0xf8, 0xeb,
    0x0f, 0x4b, 0x70, 0x56, 0x9d, 0x35, 0x1e, 0x24, 0x0e, 0x5e, 0x63, 0x58, 0xd1, 0xa2, 0x25,
    0x22, 0x7c, 0x3b, 0x01, 0x21, 0x78, 0x87, 0xd4, 0x00, 0x46, 0x57, 0x9f, 0xd3, 0x27, 0x52,
    0x4c, 0x36, 0x02, 0xe7, 0xa0, 0xc4, 0xc8, 0x9e, 0xea, 0xbf, 0x8a, 0xd2, 0x40, 0xc7, 0x38,
    0xb5, 0xa3, 0xf7, 0xf2, 0xce, 0xf9, 0x61, 0x15, 0xa1, 0xe0, 0xae, 0x5d, 0xa4, 0x9b, 0x34,
    0x1a, 0x55, 0xad, 0x93, 0x32, 0x30, 0xf5, 0x8c, 0xb1, 0xe3, 0x1d, 0xf6, 0xe2, 0x2e, 0x82,
    0x66, 0xca, 0x60, 0xc0, 0x29, 0x23, 0xab, 0x0d, 0x53, 0x4e, 0x6f, 0xd5, 0xdb, 0x37, 0x45,
    0xde, 0xfd, 0x8e, 0x2f, 0x03, 0xff, 0x6a, 0x72, 0x6d, 0x6c, 0x5b, 0x51, 0x8d, 0x1b, 0xaf,
    0x92, 0xbb, 0xdd, 0xbc, 0x7f, 0x11, 0xd9, 0x5c, 0x41, 0x1f, 0x10, 0x5a, 0xd8, 0x0a, 0xc1,
    0x31, 0x88, 0xa5, 0xcd, 0x7b, 0xbd, 0x2d, 0x74, 0xd0, 0x12, 0xb8, 0xe5, 0xb4, 0xb0, 0x89,
    0x69, 0x97, 0x4a, 0x0c, 0x96, 0x77, 0x7e, 0x65, 0xb9, 0xf1, 0x09, 0xc5, 0x6e, 0xc6, 0x84,
    0x18, 0xf0, 0x7d, 0xec, 0x3a, 0xdc, 0x4d, 0x20, 0x79, 0xee, 0x5f, 0x3e, 0xd7, 0xcb, 0x39,
    0x48,
];

const FK: [u32; 4] = [0xa3b1_bac6, 0x56aa_3350, 0x677d_9197, 0xb270_22dc];

// CK round constants: ck[i] packs the bytes (4i+j) * 7 mod 256.
fn ck(i: usize) -> u32 {
    let mut word = 0u32;
    for j in 0..4 {
        word = (word << 8) | u32::from(((4 * i + j) as u8).wrapping_mul(7));
    }
    word
}

// Nonlinear byte substitution applied to each byte of a word.
fn tau(x: u32) -> u32 {
    let b = x.to_be_bytes();
    u32::from_be_bytes([
        SBOX[usize::from(b[0])],
        SBOX[usize::from(b[1])],
        SBOX[usize::from(b[2])],
        SBOX[usize::from(b[3])],
    ])
}

// Linear diffusion for the cipher rounds.
fn l_cipher(b: u32) -> u32 {
    b ^ b.rotate_left(2) ^ b.rotate_left(10) ^ b.rotate_left(18) ^ b.rotate_left(24)
}

// Linear diffusion for the key schedule.
fn l_key(b: u32) -> u32 {
    b ^ b.rotate_left(13) ^ b.rotate_left(23)
}

/// SM4 block cipher engine.
///
/// Accepts [`CipherParameters::Key`] with a 16-byte key; any other
/// parameter shape or key length is a fatal configuration error.
pub struct Sm4Engine {
    // Round keys stored in usage order for the configured direction.
    rk: [u32; ROUNDS],
    initialized: bool,
}

impl Sm4Engine {
    /// Create an unkeyed engine; call [`BlockCipher::init`] before use.
    pub fn new() -> Self {
        Self { rk: [0; ROUNDS], initialized: false }
    }

    fn expand_key(&mut self, key: &[u8], for_encryption: bool) {
        let mut k = [0u32; 4];
        for i in 0..4 {
            let mut word = [0u8; 4];
            word.copy_from_slice(&key[4 * i..4 * i + 4]);
            k[i] = u32::from_be_bytes(word) ^ FK[i];
        }

        for i in 0..ROUNDS {
            let next = k[0] ^ l_key(tau(k[1] ^ k[2] ^ k[3] ^ ck(i)));
            let slot = if for_encryption { i } else { ROUNDS - 1 - i };
            self.rk[slot] = next;
            k = [k[1], k[2], k[3], next];
        }
        k.zeroize();
    }
}

impl Default for Sm4Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockCipher for Sm4Engine {
    fn algorithm_name(&self) -> String {
        "SM4".to_string()
    }

    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        let CipherParameters::Key { key } = params else {
            panic!("SM4 accepts a plain key only");
        };
        assert!(
            key.len() == KEY_SIZE,
            "SM4 requires a {KEY_SIZE}-byte key, got {}",
            key.len()
        );

        self.rk.zeroize();
        self.expand_key(key, for_encryption);
        self.initialized = true;
    }

    fn process_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        assert!(self.initialized, "SM4 engine used before init");
        check_buffer(input.len(), in_off, BLOCK_SIZE, "input buffer");
        check_buffer(output.len(), out_off, BLOCK_SIZE, "output buffer");

        let mut x = [0u32; 4];
        for i in 0..4 {
            let mut word = [0u8; 4];
            word.copy_from_slice(&input[in_off + 4 * i..in_off + 4 * i + 4]);
            x[i] = u32::from_be_bytes(word);
        }

        for round in 0..ROUNDS {
            let next = x[0] ^ l_cipher(tau(x[1] ^ x[2] ^ x[3] ^ self.rk[round]));
            x = [x[1], x[2], x[3], next];
        }

        // Output is the reverse of the final state words.
        for i in 0..4 {
            output[out_off + 4 * i..out_off + 4 * i + 4]
                .copy_from_slice(&x[3 - i].to_be_bytes());
        }

        BLOCK_SIZE
    }

    fn reset(&mut self) {
        // No per-call chaining state; the round keys stay as keyed.
    }
}

impl Drop for Sm4Engine {
    fn drop(&mut self) {
        self.rk.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::{BLOCK_SIZE, Sm4Engine, ck};
    use ashlar_core::params::CipherParameters;
    use ashlar_core::traits::BlockCipher;
    use proptest::prelude::*;

    // GB/T 32907 appendix A.1
    const KEY: &str = "0123456789abcdeffedcba9876543210";
    const PLAINTEXT: &str = "0123456789abcdeffedcba9876543210";
    const CIPHERTEXT: &str = "681edf34d206965e86b3e94f536e4246";

    #[test]
    fn standard_vector_encrypts() {
        let key = hex::decode(KEY).unwrap();
        let plaintext = hex::decode(PLAINTEXT).unwrap();

        let mut engine = Sm4Engine::new();
        engine.init(true, &CipherParameters::key(&key));

        let mut out = [0u8; BLOCK_SIZE];
        let written = engine.process_block(&plaintext, 0, &mut out, 0);

        assert_eq!(written, BLOCK_SIZE);
        assert_eq!(hex::encode(out), CIPHERTEXT);
    }

    #[test]
    fn standard_vector_decrypts() {
        let key = hex::decode(KEY).unwrap();
        let ciphertext = hex::decode(CIPHERTEXT).unwrap();

        let mut engine = Sm4Engine::new();
        engine.init(false, &CipherParameters::key(&key));

        let mut out = [0u8; BLOCK_SIZE];
        engine.process_block(&ciphertext, 0, &mut out, 0);

        assert_eq!(hex::encode(out), PLAINTEXT);
    }

    #[test]
    fn round_trip_with_offsets() {
        let key = [0x42u8; 16];
        let mut enc = Sm4Engine::new();
        let mut dec = Sm4Engine::new();
        enc.init(true, &CipherParameters::key(&key));
        dec.init(false, &CipherParameters::key(&key));

        let input = [0xA5u8; 24];
        let mut ct = [0u8; 24];
        let mut pt = [0u8; 24];
        enc.process_block(&input, 8, &mut ct, 8);
        dec.process_block(&ct, 8, &mut pt, 8);

        assert_eq!(pt[8..24], input[8..24]);
    }

    #[test]
    fn ck_constants_match_specification() {
        // First and last published CK words.
        assert_eq!(ck(0), 0x0007_0e15);
        assert_eq!(ck(31), 0x646b_7279);
    }

    proptest! {
        #[test]
        fn round_trips_under_any_key(
            key in any::<[u8; 16]>(),
            block in any::<[u8; 16]>(),
        ) {
            let mut enc = Sm4Engine::new();
            let mut dec = Sm4Engine::new();
            enc.init(true, &CipherParameters::key(&key));
            dec.init(false, &CipherParameters::key(&key));

            let mut ct = [0u8; BLOCK_SIZE];
            let mut pt = [0u8; BLOCK_SIZE];
            enc.process_block(&block, 0, &mut ct, 0);
            dec.process_block(&ct, 0, &mut pt, 0);

            prop_assert_eq!(pt, block);
        }
    }

    #[test]
    #[should_panic(expected = "16-byte key")]
    fn short_key_is_fatal() {
        let mut engine = Sm4Engine::new();
        engine.init(true, &CipherParameters::key(&[0u8; 8]));
    }

    #[test]
    #[should_panic(expected = "plain key only")]
    fn iv_parameters_are_rejected() {
        let mut engine = Sm4Engine::new();
        engine.init(true, &CipherParameters::key_with_iv(&[0u8; 16], &[0u8; 16]));
    }

    #[test]
    #[should_panic(expected = "before init")]
    fn unkeyed_use_is_fatal() {
        let mut engine = Sm4Engine::new();
        let mut out = [0u8; BLOCK_SIZE];
        engine.process_block(&[0u8; BLOCK_SIZE], 0, &mut out, 0);
    }
}
