//! SM3 incremental digest (GB/T 32905)
//!
//! 32-byte digest over 64-byte compression blocks. The struct buffers
//! partial blocks so input can be absorbed in arbitrary pieces.

use ashlar_core::traits::Digest;
use ashlar_core::util::check_buffer;
use zeroize::Zeroize;

/// SM3 digest size in bytes.
pub const DIGEST_SIZE: usize = 32;

/// SM3 compression block length in bytes.
pub const BLOCK_LENGTH: usize = 64;

const IV: [u32; 8] = [
    0x7380_166f, 0x4914_b2b9, 0x1724_42d7, 0xda8a_0600, 0xa96f_30bc, 0x1631_38aa, 0xe38d_ee4d,
    0xb0fb_0e4e,
];

fn p0(x: u32) -> u32 {
    x ^ x.rotate_left(9) ^ x.rotate_left(17)
}

fn p1(x: u32) -> u32 {
    x ^ x.rotate_left(15) ^ x.rotate_left(23)
}

fn ff(j: usize, x: u32, y: u32, z: u32) -> u32 {
    if j < 16 { x ^ y ^ z } else { (x & y) | (x & z) | (y & z) }
}

fn gg(j: usize, x: u32, y: u32, z: u32) -> u32 {
    if j < 16 { x ^ y ^ z } else { (x & y) | (!x & z) }
}

/// SM3 incremental digest.
pub struct Sm3Digest {
    state: [u32; 8],
    buffer: [u8; BLOCK_LENGTH],
    buffered: usize,
    processed_bytes: u64,
}

impl Sm3Digest {
    /// Create a digest in its initial state.
    pub fn new() -> Self {
        Self { state: IV, buffer: [0; BLOCK_LENGTH], buffered: 0, processed_bytes: 0 }
    }

    fn compress(&mut self) {
        let mut w = [0u32; 68];
        for j in 0..16 {
            let mut word = [0u8; 4];
            word.copy_from_slice(&self.buffer[4 * j..4 * j + 4]);
            w[j] = u32::from_be_bytes(word);
        }
        for j in 16..68 {
            w[j] = p1(w[j - 16] ^ w[j - 9] ^ w[j - 3].rotate_left(15))
                ^ w[j - 13].rotate_left(7)
                ^ w[j - 6];
        }

        let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = self.state;

        for j in 0..64 {
            let tj: u32 = if j < 16 { 0x79cc_4519 } else { 0x7a87_9d8a };
            let ss1 = a
                .rotate_left(12)
                .wrapping_add(e)
                .wrapping_add(tj.rotate_left((j % 32) as u32))
                .rotate_left(7);
            let ss2 = ss1 ^ a.rotate_left(12);
            let tt1 = ff(j, a, b, c)
                .wrapping_add(d)
                .wrapping_add(ss2)
                .wrapping_add(w[j] ^ w[j + 4]);
            let tt2 = gg(j, e, f, g).wrapping_add(h).wrapping_add(ss1).wrapping_add(w[j]);
            d = c;
            c = b.rotate_left(9);
            b = a;
            a = tt1;
            h = g;
            g = f.rotate_left(19);
            f = e;
            e = p0(tt2);
        }

        self.state[0] ^= a;
        self.state[1] ^= b;
        self.state[2] ^= c;
        self.state[3] ^= d;
        self.state[4] ^= e;
        self.state[5] ^= f;
        self.state[6] ^= g;
        self.state[7] ^= h;
    }
}

impl Default for Sm3Digest {
    fn default() -> Self {
        Self::new()
    }
}

impl Digest for Sm3Digest {
    fn algorithm_name(&self) -> String {
        "SM3".to_string()
    }

    fn digest_size(&self) -> usize {
        DIGEST_SIZE
    }

    fn block_length(&self) -> Option<usize> {
        Some(BLOCK_LENGTH)
    }

    fn update(&mut self, b: u8) {
        self.buffer[self.buffered] = b;
        self.buffered += 1;
        self.processed_bytes += 1;
        if self.buffered == BLOCK_LENGTH {
            self.compress();
            self.buffered = 0;
        }
    }

    fn block_update(&mut self, data: &[u8], off: usize, len: usize) {
        check_buffer(data.len(), off, len, "digest input");
        for &b in &data[off..off + len] {
            self.update(b);
        }
    }

    fn do_final(&mut self, out: &mut [u8], out_off: usize) -> usize {
        check_buffer(out.len(), out_off, DIGEST_SIZE, "digest output");

        let bit_length = self.processed_bytes * 8;
        self.update(0x80);
        while self.buffered != BLOCK_LENGTH - 8 {
            self.update(0);
        }
        self.buffer[BLOCK_LENGTH - 8..].copy_from_slice(&bit_length.to_be_bytes());
        self.buffered = BLOCK_LENGTH;
        self.compress();

        for i in 0..8 {
            out[out_off + 4 * i..out_off + 4 * i + 4]
                .copy_from_slice(&self.state[i].to_be_bytes());
        }

        self.reset();
        DIGEST_SIZE
    }

    fn reset(&mut self) {
        self.state = IV;
        self.buffer.zeroize();
        self.buffered = 0;
        self.processed_bytes = 0;
    }
}

impl Drop for Sm3Digest {
    fn drop(&mut self) {
        self.state.zeroize();
        self.buffer.zeroize();
    }
}
