//! Carry-less arithmetic over GF(2^128)
//!
//! The polynomial hash field used by GCM. Blocks are interpreted as
//! big-endian bit strings per the GCM convention; multiplication is the
//! bit-serial right-shift formulation with the standard reduction
//! constant, using mask arithmetic instead of branches so control flow
//! stays data-independent.

/// GCM reduction polynomial constant (x^128 + x^7 + x^2 + x + 1, bit-reflected).
const R: u128 = 0xE1 << 120;

/// The multiplicative identity in GCM's bit ordering.
#[cfg(test)]
const ONE: u128 = 1 << 127;

/// Interpret a 16-byte block as a field element.
///
/// Panics if `block` is shorter than 16 bytes.
pub fn from_block(block: &[u8]) -> u128 {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&block[..16]);
    u128::from_be_bytes(bytes)
}

/// Write a field element back out as a 16-byte block.
pub fn to_block(v: u128) -> [u8; 16] {
    v.to_be_bytes()
}

/// Multiply two field elements.
pub fn mul(x: u128, y: u128) -> u128 {
    let mut z: u128 = 0;
    let mut v = y;

    for i in 0..128 {
        let bit = (x >> (127 - i)) & 1;
        z ^= v & 0u128.wrapping_sub(bit);

        let lsb = v & 1;
        v >>= 1;
        v ^= R & 0u128.wrapping_sub(lsb);
    }

    z
}

/// One GHASH step: fold `block` into the accumulator and multiply by `h`.
pub fn ghash_block(y: u128, block: u128, h: u128) -> u128 {
    mul(y ^ block, h)
}

#[cfg(test)]
mod tests {
    use super::{ONE, from_block, ghash_block, mul, to_block};

    #[test]
    fn one_is_the_multiplicative_identity() {
        let x = from_block(&[0xD2u8; 16]);
        assert_eq!(mul(x, ONE), x);
        assert_eq!(mul(ONE, x), x);
    }

    #[test]
    fn multiplication_commutes() {
        let a = from_block(b"0123456789abcdef");
        let b = from_block(b"fedcba9876543210");
        assert_eq!(mul(a, b), mul(b, a));
    }

    #[test]
    fn multiplication_distributes_over_xor() {
        let a = from_block(&[0x5A; 16]);
        let b = from_block(&[0xC3; 16]);
        let h = from_block(&[0x99; 16]);
        assert_eq!(mul(a ^ b, h), mul(a, h) ^ mul(b, h));
    }

    #[test]
    fn zero_annihilates() {
        let x = from_block(&[0xFF; 16]);
        assert_eq!(mul(x, 0), 0);
        assert_eq!(mul(0, x), 0);
    }

    #[test]
    fn block_conversion_round_trips() {
        let block: Vec<u8> = (0u8..16).collect();
        assert_eq!(to_block(from_block(&block)).to_vec(), block);
    }

    #[test]
    fn ghash_step_folds_then_multiplies() {
        let y = from_block(&[0x01; 16]);
        let block = from_block(&[0x02; 16]);
        let h = from_block(&[0x03; 16]);
        assert_eq!(ghash_block(y, block, h), mul(y ^ block, h));
    }
}
