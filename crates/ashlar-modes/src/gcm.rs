//! Galois/Counter Mode authenticated encryption
//!
//! Composes counter-mode encryption with a GF(2^128) polynomial hash
//! into an AEAD construction. The state machine is:
//!
//! ```text
//! init ──► (optional AAD ingestion) ──► process_bytes* ──► do_final
//! ```
//!
//! Encryption produces ciphertext as it streams and appends the
//! authentication tag at finalize. Decryption buffers everything (the
//! total ciphertext length is unknown until `do_final`), verifies the
//! tag over the buffered data first, and only then releases plaintext;
//! a tag mismatch emits zero plaintext bytes.

use ashlar_core::error::CryptoError;
use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_core::util::constant_time_eq;
use tracing::trace;
use zeroize::Zeroize;

use crate::gf128;

const BLOCK_SIZE: usize = 16;

// Increment the rightmost 32 bits of the counter block, per GCM.
// Distinct from generic CTR, which carries across the whole block.
fn inc32(counter: &mut [u8; 16]) {
    let mut word = [0u8; 4];
    word.copy_from_slice(&counter[12..16]);
    let next = u32::from_be_bytes(word).wrapping_add(1);
    counter[12..16].copy_from_slice(&next.to_be_bytes());
}

/// GCM AEAD wrapper around a 16-byte block cipher.
pub struct GcmCipher<C: BlockCipher> {
    cipher: C,
    for_encryption: bool,
    initialized: bool,
    /// Tag length in bytes, 4..=16.
    mac_size: usize,
    /// Hash subkey H = E(K, 0^128); fixed once keyed.
    h: u128,
    /// Initial counter block; fixed once `init` completes.
    j0: [u8; 16],
    /// Associated data supplied at `init`, re-applied on every reset.
    init_aad: Vec<u8>,

    // Per-session working state, zeroed on reset.
    counter: [u8; 16],
    /// Running tag accumulator, seeded from `s_at` at first cipher use.
    s: u128,
    /// Associated-data accumulator.
    s_at: u128,
    at_block: [u8; 16],
    at_block_pos: usize,
    at_length: u64,
    buf_block: [u8; 16],
    buf_pos: usize,
    total_length: u64,
    /// Decrypt side buffers ciphertext plus tag until `do_final`.
    decrypt_buf: Vec<u8>,
    cipher_started: bool,
}

impl<C: BlockCipher> GcmCipher<C> {
    /// Wrap `cipher` in GCM. The cipher must use 16-byte blocks.
    pub fn new(cipher: C) -> Self {
        assert!(
            cipher.block_size() == BLOCK_SIZE,
            "GCM requires a {BLOCK_SIZE}-byte block cipher, got {}",
            cipher.block_size()
        );
        Self {
            cipher,
            for_encryption: false,
            initialized: false,
            mac_size: BLOCK_SIZE,
            h: 0,
            j0: [0; 16],
            init_aad: Vec::new(),
            counter: [0; 16],
            s: 0,
            s_at: 0,
            at_block: [0; 16],
            at_block_pos: 0,
            at_length: 0,
            buf_block: [0; 16],
            buf_pos: 0,
            total_length: 0,
            decrypt_buf: Vec::new(),
            cipher_started: false,
        }
    }

    /// Human-readable algorithm name.
    pub fn algorithm_name(&self) -> String {
        format!("{}/GCM", self.cipher.algorithm_name())
    }

    /// Configured tag length in bytes.
    pub fn mac_size(&self) -> usize {
        self.mac_size
    }

    /// Key (or re-nonce) the construction.
    ///
    /// Accepts [`CipherParameters::Aead`] (tag length 32..=128 bits in
    /// multiples of 8), [`CipherParameters::KeyWithIv`] (128-bit tag),
    /// or [`CipherParameters::IvOnly`] for a fresh nonce under the
    /// existing key. The nonce must be non-empty. Any other shape, tag
    /// size or an empty nonce is a fatal configuration error.
    pub fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        let nonce: &[u8] = match params {
            CipherParameters::Aead { key, nonce, aad, mac_bits } => {
                assert!(
                    (32..=128).contains(mac_bits) && mac_bits % 8 == 0,
                    "GCM tag size must be 32..=128 bits in multiples of 8, got {mac_bits}"
                );
                self.mac_size = mac_bits / 8;
                self.init_aad = aad.clone();
                self.rekey(key);
                nonce
            }
            CipherParameters::KeyWithIv { key, iv } => {
                self.mac_size = BLOCK_SIZE;
                self.init_aad.clear();
                self.rekey(key);
                iv
            }
            CipherParameters::IvOnly { iv } => {
                assert!(
                    self.initialized,
                    "GCM IV-only reinit requires a previously keyed cipher"
                );
                self.init_aad.clear();
                iv
            }
            CipherParameters::Key { .. } => panic!("GCM requires a nonce"),
        };
        assert!(!nonce.is_empty(), "GCM nonce must be non-empty");

        self.for_encryption = for_encryption;
        self.j0 = self.derive_j0(nonce);
        self.initialized = true;
        self.reset();
        trace!(
            mode = "GCM",
            encrypt = for_encryption,
            tag_bytes = self.mac_size,
            "cipher initialized"
        );
    }

    fn rekey(&mut self, key: &[u8]) {
        self.cipher.init(true, &CipherParameters::key(key));
        let zero = [0u8; 16];
        let mut h_block = [0u8; 16];
        self.cipher.process_block(&zero, 0, &mut h_block, 0);
        self.h = gf128::from_block(&h_block);
        h_block.zeroize();
    }

    // J0 = nonce || 0x00000001 for the 12-byte fast path, otherwise a
    // GHASH over the zero-padded nonce and its bit length.
    fn derive_j0(&self, nonce: &[u8]) -> [u8; 16] {
        if nonce.len() == 12 {
            let mut j0 = [0u8; 16];
            j0[..12].copy_from_slice(nonce);
            j0[15] = 1;
            return j0;
        }

        let mut y = 0u128;
        for chunk in nonce.chunks(BLOCK_SIZE) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            y = gf128::ghash_block(y, gf128::from_block(&block), self.h);
        }
        y = gf128::ghash_block(y, nonce.len() as u128 * 8, self.h);
        gf128::to_block(y)
    }

    /// Ingest one byte of associated data.
    ///
    /// All associated data must be supplied before the first cipher
    /// byte; later calls are a state violation.
    pub fn process_aad_byte(&mut self, b: u8) {
        assert!(self.initialized, "GCM cipher used before init");
        assert!(
            !self.cipher_started,
            "GCM associated data must precede cipher data"
        );

        self.at_block[self.at_block_pos] = b;
        self.at_block_pos += 1;
        self.at_length += 1;
        if self.at_block_pos == BLOCK_SIZE {
            self.s_at = gf128::ghash_block(self.s_at, gf128::from_block(&self.at_block), self.h);
            self.at_block_pos = 0;
        }
    }

    /// Ingest associated data.
    pub fn process_aad_bytes(&mut self, aad: &[u8]) {
        for &b in aad {
            self.process_aad_byte(b);
        }
    }

    // First real cipher use: finalize the trailing partial AAD block and
    // seed the tag accumulator from the AAD hash.
    fn start_cipher(&mut self) {
        if self.at_block_pos > 0 {
            let mut padded = [0u8; 16];
            padded[..self.at_block_pos].copy_from_slice(&self.at_block[..self.at_block_pos]);
            self.s_at = gf128::ghash_block(self.s_at, gf128::from_block(&padded), self.h);
            padded.zeroize();
            self.at_block_pos = 0;
        }
        self.s = self.s_at;
        self.cipher_started = true;
    }

    // Encrypt the buffered plaintext block into output[off..] and fold
    // the ciphertext into the tag accumulator.
    fn encrypt_buffered_block(&mut self, output: &mut [u8], off: usize) {
        inc32(&mut self.counter);
        let mut keystream = [0u8; 16];
        self.cipher.process_block(&self.counter, 0, &mut keystream, 0);
        for i in 0..BLOCK_SIZE {
            output[off + i] = self.buf_block[i] ^ keystream[i];
        }
        keystream.zeroize();

        self.s = gf128::ghash_block(
            self.s,
            gf128::from_block(&output[off..off + BLOCK_SIZE]),
            self.h,
        );
        self.total_length += BLOCK_SIZE as u64;
    }

    /// Stream cipher data through the construction.
    ///
    /// Encrypting: emits a ciphertext block for every completed input
    /// block and returns the bytes written. Decrypting: buffers the
    /// input (ciphertext plus trailing tag) and returns 0; plaintext
    /// only appears from [`do_final`](Self::do_final).
    pub fn process_bytes(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "GCM cipher" });
        }

        if !self.for_encryption {
            self.decrypt_buf.extend_from_slice(input);
            return Ok(0);
        }

        // Check output space up front so no state advances on error.
        let will_write = (self.buf_pos + input.len()) / BLOCK_SIZE * BLOCK_SIZE;
        if output.len() < will_write {
            return Err(CryptoError::OutputTooShort {
                needed: will_write,
                available: output.len(),
            });
        }

        if !self.cipher_started {
            self.start_cipher();
        }

        let mut written = 0;
        for &b in input {
            self.buf_block[self.buf_pos] = b;
            self.buf_pos += 1;
            if self.buf_pos == BLOCK_SIZE {
                self.encrypt_buffered_block(output, written);
                written += BLOCK_SIZE;
                self.buf_pos = 0;
            }
        }
        Ok(written)
    }

    /// Output size `do_final` will produce after `len` further input
    /// bytes, accounting for internally buffered data and the tag.
    pub fn get_output_size(&self, len: usize) -> usize {
        if self.for_encryption {
            len + self.buf_pos + self.mac_size
        } else {
            (len + self.decrypt_buf.len()).saturating_sub(self.mac_size)
        }
    }

    /// Finalize the session.
    ///
    /// Encrypting: emits the final partial ciphertext block plus the
    /// tag and auto-resets. Decrypting: verifies the tag over all
    /// buffered data; on success decrypts and emits the plaintext and
    /// auto-resets, on mismatch returns [`CryptoError::MacCheckFailed`]
    /// without emitting anything and leaves the session for inspection.
    pub fn do_final(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "GCM cipher" });
        }

        if self.for_encryption {
            self.finalize_encrypt(output)
        } else {
            self.finalize_decrypt(output)
        }
    }

    fn finalize_encrypt(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        let extra = self.buf_pos;
        let needed = extra + self.mac_size;
        if output.len() < needed {
            return Err(CryptoError::OutputTooShort { needed, available: output.len() });
        }

        if !self.cipher_started {
            self.start_cipher();
        }

        if extra > 0 {
            inc32(&mut self.counter);
            let mut keystream = [0u8; 16];
            self.cipher.process_block(&self.counter, 0, &mut keystream, 0);

            let mut last = [0u8; 16];
            for i in 0..extra {
                last[i] = self.buf_block[i] ^ keystream[i];
            }
            keystream.zeroize();

            // Trailing partial block is zero-padded into the hash.
            self.s = gf128::ghash_block(self.s, gf128::from_block(&last), self.h);
            output[..extra].copy_from_slice(&last[..extra]);
            last.zeroize();
            self.total_length += extra as u64;
        }

        let tag = self.compute_tag(self.total_length);
        output[extra..needed].copy_from_slice(&tag[..self.mac_size]);

        trace!(mode = "GCM", bytes = self.total_length, "encryption finalized");
        self.reset();
        Ok(needed)
    }

    fn finalize_decrypt(&mut self, output: &mut [u8]) -> Result<usize, CryptoError> {
        if self.decrypt_buf.len() < self.mac_size {
            return Err(CryptoError::InputTooShort {
                needed: self.mac_size,
                available: self.decrypt_buf.len(),
            });
        }
        let data_len = self.decrypt_buf.len() - self.mac_size;
        if output.len() < data_len {
            return Err(CryptoError::OutputTooShort {
                needed: data_len,
                available: output.len(),
            });
        }

        if !self.cipher_started {
            self.start_cipher();
        }

        let mut buffered = std::mem::take(&mut self.decrypt_buf);

        // Re-derive the tag over the buffered ciphertext.
        for chunk in buffered[..data_len].chunks(BLOCK_SIZE) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            self.s = gf128::ghash_block(self.s, gf128::from_block(&block), self.h);
        }
        let expected = self.compute_tag(data_len as u64);

        // Full configured tag length, constant time; never a fixed 16.
        if !constant_time_eq(&expected[..self.mac_size], &buffered[data_len..]) {
            self.decrypt_buf = buffered;
            return Err(CryptoError::MacCheckFailed);
        }

        // Tag verified; run the same counter sequence to decrypt.
        let mut counter = self.j0;
        let mut off = 0;
        for chunk in buffered[..data_len].chunks(BLOCK_SIZE) {
            inc32(&mut counter);
            let mut keystream = [0u8; 16];
            self.cipher.process_block(&counter, 0, &mut keystream, 0);
            for (i, &c) in chunk.iter().enumerate() {
                output[off + i] = c ^ keystream[i];
            }
            keystream.zeroize();
            off += chunk.len();
        }

        buffered.zeroize();
        trace!(mode = "GCM", bytes = data_len, "decryption finalized");
        self.reset();
        Ok(data_len)
    }

    // Tag = E(K, J0) XOR GHASH result, after folding the 128-bit length
    // block (AAD bits high, ciphertext bits low, both big-endian).
    fn compute_tag(&mut self, data_bytes: u64) -> [u8; 16] {
        let len_block =
            (u128::from(self.at_length) * 8) << 64 | u128::from(data_bytes) * 8;
        self.s = gf128::ghash_block(self.s, len_block, self.h);

        let mut ek_j0 = [0u8; 16];
        self.cipher.process_block(&self.j0, 0, &mut ek_j0, 0);
        let tag = gf128::to_block(gf128::from_block(&ek_j0) ^ self.s);
        ek_j0.zeroize();
        tag
    }

    /// Clear all per-session state, keeping the key, nonce-derived
    /// counter start and any init-time associated data.
    pub fn reset(&mut self) {
        self.s = 0;
        self.s_at = 0;
        self.at_block.zeroize();
        self.at_block_pos = 0;
        self.at_length = 0;
        self.buf_block.zeroize();
        self.buf_pos = 0;
        self.total_length = 0;
        self.decrypt_buf.zeroize();
        self.decrypt_buf.clear();
        self.counter = self.j0;
        self.cipher_started = false;
        self.cipher.reset();

        if !self.init_aad.is_empty() {
            let aad = std::mem::take(&mut self.init_aad);
            self.process_aad_bytes(&aad);
            self.init_aad = aad;
        }
    }
}

impl<C: BlockCipher> Drop for GcmCipher<C> {
    fn drop(&mut self) {
        self.h = 0;
        self.s = 0;
        self.s_at = 0;
        self.j0.zeroize();
        self.counter.zeroize();
        self.at_block.zeroize();
        self.buf_block.zeroize();
        self.decrypt_buf.zeroize();
        self.init_aad.zeroize();
    }
}
