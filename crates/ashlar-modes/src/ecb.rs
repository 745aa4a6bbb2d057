//! Electronic Codebook mode
//!
//! Stateless per-block pass-through with no chaining whatsoever:
//! identical plaintext blocks encrypt to identical ciphertext blocks,
//! which leaks data patterns. Kept for legacy compatibility and as a
//! negative-test fixture; do not use it in new designs.

use ashlar_core::params::CipherParameters;
use ashlar_core::traits::BlockCipher;
use tracing::trace;

/// ECB wrapper around a block cipher.
pub struct EcbMode<C: BlockCipher> {
    cipher: C,
    block_size: usize,
    initialized: bool,
}

impl<C: BlockCipher> EcbMode<C> {
    /// Wrap `cipher` in ECB mode.
    pub fn new(cipher: C) -> Self {
        let block_size = cipher.block_size();
        Self { cipher, block_size, initialized: false }
    }
}

impl<C: BlockCipher> BlockCipher for EcbMode<C> {
    fn algorithm_name(&self) -> String {
        format!("{}/ECB", self.cipher.algorithm_name())
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn init(&mut self, for_encryption: bool, params: &CipherParameters) {
        let CipherParameters::Key { .. } = params else {
            panic!("ECB mode accepts a plain key only");
        };
        self.cipher.init(for_encryption, params);
        self.initialized = true;
        trace!(mode = "ECB", encrypt = for_encryption, "cipher initialized");
    }

    fn process_block(
        &mut self,
        input: &[u8],
        in_off: usize,
        output: &mut [u8],
        out_off: usize,
    ) -> usize {
        assert!(self.initialized, "ECB mode used before init");
        self.cipher.process_block(input, in_off, output, out_off)
    }

    fn reset(&mut self) {
        self.cipher.reset();
    }
}
