//! PKCS#7 block padding
//!
//! Fills the tail of the final block with N copies of the byte N. The
//! pad count check scans the whole block with flag arithmetic so a
//! corrupted pad takes the same time to reject regardless of where the
//! corruption sits.

use ashlar_core::error::CryptoError;
use ashlar_core::traits::Padding;

/// PKCS#7 padding scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pkcs7Padding;

impl Pkcs7Padding {
    /// Construct the padding scheme.
    pub fn new() -> Self {
        Self
    }
}

impl Padding for Pkcs7Padding {
    fn padding_name(&self) -> String {
        "PKCS7".to_owned()
    }

    fn add_padding(&self, buf: &mut [u8], offset: usize) -> usize {
        let count = buf.len() - offset;
        assert!(
            count > 0 && count <= 255,
            "PKCS#7 pad length must be 1..=255, got {count}"
        );
        for b in &mut buf[offset..] {
            *b = count as u8;
        }
        count
    }

    fn pad_count(&self, buf: &[u8]) -> Result<usize, CryptoError> {
        assert!(!buf.is_empty(), "cannot read a pad count from an empty block");

        let count = buf[buf.len() - 1] as usize;

        // Accumulate failures as flags; no early exit on mismatch.
        let mut bad = (count == 0) as usize | (count > buf.len()) as usize;
        for (i, &b) in buf.iter().enumerate() {
            let in_pad = (buf.len() - i <= count) as usize;
            let mismatch = (b as usize != count) as usize;
            bad |= in_pad & mismatch;
        }

        if bad != 0 {
            return Err(CryptoError::PadCorrupted);
        }
        Ok(count)
    }
}
