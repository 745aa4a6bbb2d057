//! HMAC over any incremental digest
//!
//! The standard two-pass construction: the digest is primed with the
//! inner-padded key, absorbs the message, and the inner hash is hashed
//! again under the outer-padded key. After finalize the digest is
//! re-primed with the inner pad so the next message can start
//! immediately.

use ashlar_core::error::CryptoError;
use ashlar_core::params::CipherParameters;
use ashlar_core::traits::{Digest, Mac};
use ashlar_core::util::check_buffer;
use tracing::trace;
use zeroize::Zeroize;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5C;

/// Fallback block length for digests that do not advertise one.
const DEFAULT_BLOCK_LENGTH: usize = 64;

/// HMAC construction over the digest `D`.
pub struct HmacMac<D: Digest> {
    digest: D,
    block_length: usize,
    inner_pad: Vec<u8>,
    outer_pad: Vec<u8>,
    initialized: bool,
}

impl<D: Digest> HmacMac<D> {
    /// Wrap `digest` in HMAC. The instance is unusable until keyed via
    /// [`Mac::init`].
    pub fn new(digest: D) -> Self {
        let block_length = digest.block_length().unwrap_or(DEFAULT_BLOCK_LENGTH);
        Self {
            digest,
            block_length,
            inner_pad: Vec::new(),
            outer_pad: Vec::new(),
            initialized: false,
        }
    }

    // Prime a fresh inner hash: digest state = H(inner_pad || ...).
    fn prime_inner(&mut self) {
        self.digest.reset();
        self.digest.block_update(&self.inner_pad, 0, self.inner_pad.len());
    }
}

impl<D: Digest> Mac for HmacMac<D> {
    fn algorithm_name(&self) -> String {
        format!("HMAC-{}", self.digest.algorithm_name())
    }

    fn mac_size(&self) -> usize {
        self.digest.digest_size()
    }

    fn init(&mut self, params: &CipherParameters) -> Result<(), CryptoError> {
        let CipherParameters::Key { key } = params else {
            panic!("HMAC accepts a plain key only");
        };

        // Oversized keys are hashed down to the digest size first.
        let mut key_block = vec![0u8; self.block_length];
        if key.len() > self.block_length {
            self.digest.reset();
            self.digest.block_update(key, 0, key.len());
            self.digest.do_final(&mut key_block, 0);
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }

        self.inner_pad.zeroize();
        self.outer_pad.zeroize();
        self.inner_pad = key_block.iter().map(|&b| b ^ IPAD).collect();
        self.outer_pad = key_block.iter().map(|&b| b ^ OPAD).collect();
        key_block.zeroize();

        self.initialized = true;
        self.prime_inner();
        trace!(mac = %self.algorithm_name(), "mac initialized");
        Ok(())
    }

    fn update(&mut self, b: u8) -> Result<(), CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "HMAC" });
        }
        self.digest.update(b);
        Ok(())
    }

    fn block_update(&mut self, data: &[u8], off: usize, len: usize) -> Result<(), CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "HMAC" });
        }
        self.digest.block_update(data, off, len);
        Ok(())
    }

    fn do_final(&mut self, out: &mut [u8], out_off: usize) -> Result<usize, CryptoError> {
        if !self.initialized {
            return Err(CryptoError::NotInitialized { what: "HMAC" });
        }
        let size = self.mac_size();
        check_buffer(out.len(), out_off, size, "output buffer");

        let mut inner = vec![0u8; size];
        self.digest.do_final(&mut inner, 0);

        self.digest.block_update(&self.outer_pad, 0, self.outer_pad.len());
        self.digest.block_update(&inner, 0, inner.len());
        self.digest.do_final(out, out_off);
        inner.zeroize();

        // Ready for the next message without an explicit reset.
        self.prime_inner();
        Ok(size)
    }

    fn reset(&mut self) {
        if self.initialized {
            self.prime_inner();
        } else {
            self.digest.reset();
        }
    }
}

impl<D: Digest> Drop for HmacMac<D> {
    fn drop(&mut self) {
        self.inner_pad.zeroize();
        self.outer_pad.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::HmacMac;
    use ashlar_core::error::CryptoError;
    use ashlar_core::params::CipherParameters;
    use ashlar_core::traits::{Digest, Mac};
    use ashlar_engines::Sm3Digest;

    fn keyed(key: &[u8]) -> HmacMac<Sm3Digest> {
        let mut mac = HmacMac::new(Sm3Digest::new());
        mac.init(&CipherParameters::key(key)).unwrap();
        mac
    }

    fn tag_of(mac: &mut HmacMac<Sm3Digest>, message: &[u8]) -> Vec<u8> {
        mac.block_update(message, 0, message.len()).unwrap();
        let mut out = vec![0u8; mac.mac_size()];
        mac.do_final(&mut out, 0).unwrap();
        out
    }

    #[test]
    fn matches_a_manual_two_pass_computation() {
        let key = [0x0Bu8; 20];
        let message = b"Hi There";
        let tag = tag_of(&mut keyed(&key), message);

        // H((K' ^ opad) || H((K' ^ ipad) || m)) built by hand.
        let mut key_block = [0u8; 64];
        key_block[..20].copy_from_slice(&key);

        let mut digest = Sm3Digest::new();
        let ipad: Vec<u8> = key_block.iter().map(|&b| b ^ 0x36).collect();
        let opad: Vec<u8> = key_block.iter().map(|&b| b ^ 0x5C).collect();

        let mut inner = [0u8; 32];
        digest.block_update(&ipad, 0, 64);
        digest.block_update(message, 0, message.len());
        digest.do_final(&mut inner, 0);

        let mut expected = [0u8; 32];
        digest.block_update(&opad, 0, 64);
        digest.block_update(&inner, 0, 32);
        digest.do_final(&mut expected, 0);

        assert_eq!(tag, expected);
    }

    #[test]
    fn auto_resets_between_messages() {
        let mut mac = keyed(b"persistent key");
        let first = tag_of(&mut mac, b"message one");
        let again = tag_of(&mut mac, b"message one");
        assert_eq!(first, again);

        let different = tag_of(&mut mac, b"message two");
        assert_ne!(first, different);
    }

    #[test]
    fn reset_discards_a_partial_message() {
        let mut mac = keyed(b"key");
        mac.block_update(b"garbage prefix", 0, 14).unwrap();
        mac.reset();
        let tag = tag_of(&mut mac, b"clean message");
        assert_eq!(tag, tag_of(&mut keyed(b"key"), b"clean message"));
    }

    #[test]
    fn long_keys_are_hashed_down() {
        let long_key = [0xAAu8; 131];
        let mut digest = Sm3Digest::new();
        digest.block_update(&long_key, 0, 131);
        let mut hashed = vec![0u8; 32];
        digest.do_final(&mut hashed, 0);

        let tag_long = tag_of(&mut keyed(&long_key), b"m");
        let tag_hashed = tag_of(&mut keyed(&hashed), b"m");
        assert_eq!(tag_long, tag_hashed);
    }

    #[test]
    fn different_keys_give_different_tags() {
        let a = tag_of(&mut keyed(b"key a"), b"same message");
        let b = tag_of(&mut keyed(b"key b"), b"same message");
        assert_ne!(a, b);
    }

    #[test]
    fn unkeyed_use_is_an_error() {
        let mut mac = HmacMac::new(Sm3Digest::new());
        assert_eq!(
            mac.update(0x00),
            Err(CryptoError::NotInitialized { what: "HMAC" })
        );
        let mut out = [0u8; 32];
        assert_eq!(
            mac.do_final(&mut out, 0),
            Err(CryptoError::NotInitialized { what: "HMAC" })
        );
    }

    #[test]
    #[should_panic(expected = "plain key only")]
    fn iv_parameters_are_fatal() {
        let mut mac = HmacMac::new(Sm3Digest::new());
        let _ = mac.init(&CipherParameters::key_with_iv(b"key", b"iv"));
    }
}
