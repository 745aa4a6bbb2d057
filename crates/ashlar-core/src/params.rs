//! Keying material passed into `init`
//!
//! A closed set of parameter shapes modeled as a tagged sum type. Each
//! construction matches on exactly the variants it accepts and treats any
//! other variant as a fatal configuration error. Key bytes are copied
//! defensively on construction, never mutated afterwards, and zeroized on
//! drop.

use zeroize::Zeroize;

/// Tagged key/configuration material for cipher and MAC initialization.
///
/// Constructed once by the caller and passed by reference into `init`.
/// The same parameters value may be reused to key independent instances;
/// the key bytes are read-only after construction.
#[derive(Clone)]
pub enum CipherParameters {
    /// A plain key with no IV (ECB, block cipher engines, HMAC)
    Key {
        /// Raw key bytes
        key: Vec<u8>,
    },

    /// A key plus an IV or nonce (CBC, CFB, OFB, CTR, stream engines,
    /// GCM with a default 128-bit tag)
    KeyWithIv {
        /// Raw key bytes
        key: Vec<u8>,
        /// IV or nonce bytes; length requirements are per-mode
        iv: Vec<u8>,
    },

    /// Full AEAD parameters (GCM)
    Aead {
        /// Raw key bytes
        key: Vec<u8>,
        /// Nonce bytes; must be non-empty
        nonce: Vec<u8>,
        /// Associated data authenticated but not encrypted
        aad: Vec<u8>,
        /// Tag length in bits; 32..=128 and a multiple of 8
        mac_bits: usize,
    },

    /// A fresh IV for an already-keyed instance. Reinitializing without a
    /// key requires the encrypt/decrypt direction to stay unchanged.
    IvOnly {
        /// IV or nonce bytes
        iv: Vec<u8>,
    },
}

impl CipherParameters {
    /// Plain key parameters with a defensive copy of `key`.
    pub fn key(key: &[u8]) -> Self {
        Self::Key { key: key.to_vec() }
    }

    /// Key-plus-IV parameters with defensive copies.
    pub fn key_with_iv(key: &[u8], iv: &[u8]) -> Self {
        Self::KeyWithIv { key: key.to_vec(), iv: iv.to_vec() }
    }

    /// AEAD parameters with defensive copies.
    pub fn aead(key: &[u8], nonce: &[u8], aad: &[u8], mac_bits: usize) -> Self {
        Self::Aead {
            key: key.to_vec(),
            nonce: nonce.to_vec(),
            aad: aad.to_vec(),
            mac_bits,
        }
    }

    /// IV-only reinitialization parameters.
    pub fn iv_only(iv: &[u8]) -> Self {
        Self::IvOnly { iv: iv.to_vec() }
    }
}

// Key material is wiped when parameters go out of scope. IVs and AAD are
// not secret but get cleared along the way since they share the variants.
impl Drop for CipherParameters {
    fn drop(&mut self) {
        match self {
            Self::Key { key } => key.zeroize(),
            Self::KeyWithIv { key, iv } => {
                key.zeroize();
                iv.zeroize();
            }
            Self::Aead { key, nonce, aad, .. } => {
                key.zeroize();
                nonce.zeroize();
                aad.zeroize();
            }
            Self::IvOnly { iv } => iv.zeroize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CipherParameters;

    #[test]
    fn key_is_copied_defensively() {
        let mut source = vec![0xAA; 16];
        let params = CipherParameters::key(&source);
        source[0] = 0x00;

        let CipherParameters::Key { key } = &params else {
            panic!("expected Key variant");
        };
        assert_eq!(key[0], 0xAA);
    }

    #[test]
    fn aead_carries_all_fields() {
        let params = CipherParameters::aead(&[1; 16], &[2; 12], &[3; 4], 96);
        let CipherParameters::Aead { key, nonce, aad, mac_bits } = &params else {
            panic!("expected Aead variant");
        };
        assert_eq!(key.len(), 16);
        assert_eq!(nonce.len(), 12);
        assert_eq!(aad.len(), 4);
        assert_eq!(*mac_bits, 96);
    }
}
