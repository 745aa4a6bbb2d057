//! Byte-level helpers shared across the pipeline

/// Compare two slices in constant time.
///
/// Examines every byte of both slices with no data-dependent branches;
/// unequal lengths compare unequal but still walk the shorter slice.
/// Used for authentication tag verification, where a short-circuit
/// compare would leak the matching prefix length.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for i in 0..a.len() {
        diff |= a[i] ^ b[i];
    }
    diff == 0
}

/// XOR `src` into `dst` byte-wise. Panics if `src` is longer than `dst`.
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    assert!(src.len() <= dst.len(), "xor source longer than destination");
    for i in 0..src.len() {
        dst[i] ^= src[i];
    }
}

/// Assert that `buf[off..]` holds at least `needed` bytes.
///
/// The panic message names the violating buffer so mode-layer
/// preconditions read as contract violations, not index errors.
pub fn check_buffer(buf_len: usize, off: usize, needed: usize, what: &str) {
    assert!(
        off <= buf_len && buf_len - off >= needed,
        "{what} too short: need {needed} bytes past offset {off}, have {buf_len} total",
    );
}

#[cfg(test)]
mod tests {
    use super::{check_buffer, constant_time_eq, xor_in_place};

    #[test]
    fn equal_slices_compare_equal() {
        assert!(constant_time_eq(b"0123456789abcdef", b"0123456789abcdef"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn unequal_slices_compare_unequal() {
        assert!(!constant_time_eq(b"0123456789abcdef", b"0123456789abcdeX"));
        assert!(!constant_time_eq(b"short", b"longer"));
    }

    #[test]
    fn xor_in_place_xors() {
        let mut dst = [0b1111_0000u8, 0b0000_1111];
        xor_in_place(&mut dst, &[0b1010_1010, 0b1010_1010]);
        assert_eq!(dst, [0b0101_1010, 0b1010_0101]);
    }

    #[test]
    #[should_panic(expected = "input buffer too short")]
    fn check_buffer_panics_when_short() {
        check_buffer(16, 8, 16, "input buffer");
    }

    #[test]
    fn check_buffer_accepts_exact_fit() {
        check_buffer(32, 16, 16, "input buffer");
    }
}
