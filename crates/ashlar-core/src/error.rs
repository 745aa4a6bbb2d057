//! Error types for the cipher pipeline
//!
//! Only data-dependent, recoverable failures live here. Violated
//! preconditions (caller bugs) panic at the offending call instead; see
//! the crate-level error model notes.

use thiserror::Error;

/// Errors from cipher, AEAD and MAC operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Output buffer cannot hold the bytes a finalize call must emit
    #[error("output buffer too short: need {needed} bytes, have {available}")]
    OutputTooShort {
        /// Bytes the operation must write
        needed: usize,
        /// Bytes the caller provided room for
        available: usize,
    },

    /// Accumulated input is shorter than the minimum the operation needs
    /// (e.g. AEAD decryption received less than one authentication tag)
    #[error("input too short: need at least {needed} bytes, have {available}")]
    InputTooShort {
        /// Minimum bytes required
        needed: usize,
        /// Bytes actually accumulated
        available: usize,
    },

    /// Authentication tag did not match; no plaintext was produced
    #[error("mac check failed")]
    MacCheckFailed,

    /// Trailing padding bytes are not a valid pad block
    #[error("pad block corrupted")]
    PadCorrupted,

    /// Decryption input does not divide into whole cipher blocks
    #[error("data not block size aligned: {length} bytes with {block_size}-byte blocks")]
    NotBlockAligned {
        /// Total accumulated input length
        length: usize,
        /// Block size of the underlying cipher
        block_size: usize,
    },

    /// Operation invoked before a successful `init`
    #[error("{what} used before initialization")]
    NotInitialized {
        /// The primitive or construction that was not initialized
        what: &'static str,
    },

    /// Keyed primitive rejected the key length it was handed
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Key length the primitive requires
        expected: usize,
        /// Key length actually supplied
        actual: usize,
    },

    /// Keyed primitive rejected the nonce/IV length it was handed
    #[error("invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonceLength {
        /// Nonce length the primitive requires
        expected: usize,
        /// Nonce length actually supplied
        actual: usize,
    },
}

impl CryptoError {
    /// Returns true if this error means the data failed verification
    /// (tampering or corruption), as opposed to a sizing or usage problem.
    ///
    /// Verification failures must never be retried with relaxed checks;
    /// sizing problems are fixable by the caller and safe to retry.
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::MacCheckFailed | Self::PadCorrupted)
    }
}

#[cfg(test)]
mod tests {
    use super::CryptoError;

    #[test]
    fn mac_check_is_verification_failure() {
        assert!(CryptoError::MacCheckFailed.is_verification_failure());
        assert!(CryptoError::PadCorrupted.is_verification_failure());
    }

    #[test]
    fn sizing_errors_are_not_verification_failures() {
        let err = CryptoError::OutputTooShort { needed: 32, available: 16 };
        assert!(!err.is_verification_failure());

        let err = CryptoError::NotBlockAligned { length: 17, block_size: 16 };
        assert!(!err.is_verification_failure());
    }

    #[test]
    fn error_display() {
        let err = CryptoError::OutputTooShort { needed: 32, available: 16 };
        assert_eq!(err.to_string(), "output buffer too short: need 32 bytes, have 16");

        let err = CryptoError::NotInitialized { what: "GCM cipher" };
        assert_eq!(err.to_string(), "GCM cipher used before initialization");
    }
}
