//! Common contract for checksum engines

use crate::encode::ByteOrder;
use crate::hash::Digest;
use std::fmt;

/// Per-engine settings, fixed once the engine is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Order used when serializing the final register
    pub byte_order: ByteOrder,
    /// Bit-reverse each input byte before it enters the register (CRC only)
    pub reflect_input: bool,
    /// Bit-reverse the register before the final XOR (CRC only)
    pub reflect_output: bool,
}

impl EngineConfig {
    /// Big-endian output, no reflection
    pub const fn new() -> Self {
        Self {
            byte_order: ByteOrder::BigEndian,
            reflect_input: false,
            reflect_output: false,
        }
    }

    /// Big-endian output with both reflection flags set as given
    pub const fn reflected(reflect_input: bool, reflect_output: bool) -> Self {
        Self {
            byte_order: ByteOrder::BigEndian,
            reflect_input,
            reflect_output,
        }
    }

    /// Same settings with a different output byte order
    pub const fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental state for one computation
pub trait StreamHasher {
    /// Feed more input
    fn update(&mut self, data: &[u8]);

    /// Finish and produce the digest
    fn finalize(self: Box<Self>) -> Digest;
}

/// A checksum algorithm: `compute(bytes) -> digest`
///
/// Engines are immutable after construction and may be shared between
/// threads. Every call starts from the algorithm's initial state, so calling
/// `compute` twice on the same input yields the same digest.
pub trait HashEngine: Send + Sync + fmt::Debug {
    /// Human-readable algorithm name
    fn name(&self) -> &str;

    /// Engine settings
    fn config(&self) -> &EngineConfig;

    /// Digest size in bytes
    fn output_len(&self) -> usize;

    /// Start a streaming computation
    fn hasher(&self) -> Box<dyn StreamHasher + '_>;

    /// Compute the digest of `data` in one call
    fn compute(&self, data: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Byte order used for the digest and for scalar seeds
    fn byte_order(&self) -> ByteOrder {
        self.config().byte_order
    }
}
