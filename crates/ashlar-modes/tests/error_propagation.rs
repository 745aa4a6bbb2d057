//! Ciphertext-corruption propagation characteristics per mode.
//!
//! Each mode has a well-defined blast radius for a single flipped
//! ciphertext bit; these tests pin those down.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use ashlar_engines::Sm4Engine;
use ashlar_modes::{CbcMode, CfbMode, CtrMode, OfbMode};

const KEY: [u8; 16] = [0xC1; 16];
const IV: [u8; 16] = [0xD2; 16];
const NONCE: [u8; 12] = [0xE3; 12];

fn cbc_encrypt(plaintext: &[u8]) -> Vec<u8> {
    let mut enc = CbcMode::new(Sm4Engine::new());
    enc.init(true, &CipherParameters::key_with_iv(&KEY, &IV));
    let mut ct = vec![0u8; plaintext.len()];
    for off in (0..plaintext.len()).step_by(16) {
        enc.process_block(plaintext, off, &mut ct, off);
    }
    ct
}

fn cbc_decrypt(ciphertext: &[u8]) -> Vec<u8> {
    let mut dec = CbcMode::new(Sm4Engine::new());
    dec.init(false, &CipherParameters::key_with_iv(&KEY, &IV));
    let mut pt = vec![0u8; ciphertext.len()];
    for off in (0..ciphertext.len()).step_by(16) {
        dec.process_block(ciphertext, off, &mut pt, off);
    }
    pt
}

#[test]
fn cbc_corruption_spans_exactly_two_blocks() {
    let plaintext: Vec<u8> = (0u8..48).collect();
    let mut ct = cbc_encrypt(&plaintext);

    // Flip bit 2 of byte 5 in the first ciphertext block.
    ct[5] ^= 0x04;
    let pt = cbc_decrypt(&ct);

    // Block 0 deciphers to garbage.
    assert_ne!(&pt[..16], &plaintext[..16]);
    // Block 1 inherits exactly the flipped bit through the XOR chain.
    let diff: Vec<u8> = pt[16..32]
        .iter()
        .zip(&plaintext[16..32])
        .map(|(a, b)| a ^ b)
        .collect();
    let mut expected = [0u8; 16];
    expected[5] = 0x04;
    assert_eq!(diff, expected);
    // Block 2 is untouched.
    assert_eq!(&pt[32..], &plaintext[32..]);
}

#[test]
fn ctr_corruption_flips_exactly_one_bit() {
    let plaintext = [0x00u8; 40];
    let mut enc = CtrMode::new(Sm4Engine::new());
    enc.init(true, &CipherParameters::key_with_iv(&KEY, &NONCE));
    let mut ct = vec![0u8; 40];
    enc.process_bytes(&plaintext, 0, 40, &mut ct, 0);

    ct[20] ^= 0x10;

    let mut dec = CtrMode::new(Sm4Engine::new());
    dec.init(false, &CipherParameters::key_with_iv(&KEY, &NONCE));
    let mut pt = vec![0u8; 40];
    dec.process_bytes(&ct, 0, 40, &mut pt, 0);

    for (i, &b) in pt.iter().enumerate() {
        assert_eq!(b, if i == 20 { 0x10 } else { 0x00 });
    }
}

#[test]
fn ofb_corruption_flips_exactly_one_bit() {
    let plaintext = [0x00u8; 40];
    let mut enc = OfbMode::new(Sm4Engine::new(), 128);
    enc.init(true, &CipherParameters::key_with_iv(&KEY, &IV));
    let mut ct: Vec<u8> = plaintext.iter().map(|&b| enc.process_byte(b)).collect();

    ct[33] ^= 0x01;

    let mut dec = OfbMode::new(Sm4Engine::new(), 128);
    dec.init(false, &CipherParameters::key_with_iv(&KEY, &IV));
    let pt: Vec<u8> = ct.iter().map(|&b| dec.process_byte(b)).collect();

    for (i, &b) in pt.iter().enumerate() {
        assert_eq!(b, if i == 33 { 0x01 } else { 0x00 });
    }
}

#[test]
fn cfb_corruption_in_the_final_block_flips_one_bit() {
    // The garbled-register effect only lands on blocks after the
    // corrupted one; the final block has no successor.
    let plaintext = [0x00u8; 32];
    let mut enc = CfbMode::new(Sm4Engine::new(), 128);
    enc.init(true, &CipherParameters::key_with_iv(&KEY, &IV));
    let mut ct: Vec<u8> = plaintext.iter().map(|&b| enc.process_byte(b)).collect();

    ct[31] ^= 0x40;

    let mut dec = CfbMode::new(Sm4Engine::new(), 128);
    dec.init(false, &CipherParameters::key_with_iv(&KEY, &IV));
    let pt: Vec<u8> = ct.iter().map(|&b| dec.process_byte(b)).collect();

    for (i, &b) in pt.iter().enumerate() {
        assert_eq!(b, if i == 31 { 0x40 } else { 0x00 });
    }
}

#[test]
fn cfb_corruption_garbles_the_following_block() {
    let plaintext: Vec<u8> = (0u8..48).collect();
    let mut enc = CfbMode::new(Sm4Engine::new(), 128);
    enc.init(true, &CipherParameters::key_with_iv(&KEY, &IV));
    let mut ct: Vec<u8> = plaintext.iter().map(|&b| enc.process_byte(b)).collect();

    ct[0] ^= 0x80;

    let mut dec = CfbMode::new(Sm4Engine::new(), 128);
    dec.init(false, &CipherParameters::key_with_iv(&KEY, &IV));
    let pt: Vec<u8> = ct.iter().map(|&b| dec.process_byte(b)).collect();

    // Block 0: only the flipped bit, keystream still matches.
    assert_eq!(pt[0] ^ plaintext[0], 0x80);
    assert_eq!(&pt[1..16], &plaintext[1..16]);
    // Block 1 sees the corrupted register and deciphers to garbage.
    assert_ne!(&pt[16..32], &plaintext[16..32]);
    // Block 2 is past the register window and recovers.
    assert_eq!(&pt[32..], &plaintext[32..]);
}
