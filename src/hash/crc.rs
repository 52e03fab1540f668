//! Table-driven CRC for register widths of 8 to 64 bits
//!
//! The register is processed most-significant bit first. Reflected
//! algorithms are expressed by bit-reversing each input byte and the final
//! register, so one table layout serves every catalogue entry.
//!
//! ```
//! use smartsum::hash::{Crc, CrcCatalog, HashEngine};
//!
//! let crc = Crc::from_catalog(CrcCatalog::Crc64Xz);
//! assert_eq!(crc.compute(b"123456789").to_hex(), "995dc9bbdf1939fa");
//! ```

use crate::encode::ByteOrder;
use crate::error::{ChecksumError, Result};
use crate::hash::{Digest, EngineConfig, HashEngine, StreamHasher};
use std::borrow::Cow;
use std::sync::OnceLock;

/// Reverse the low `width` bits of `value`.
///
/// Bit `i` of the input ends up at bit `width - 1 - i`; bits at or above
/// `width` are dropped. A `width` outside `1..=64` returns `value` unchanged.
pub fn reflect(value: u64, width: u32) -> u64 {
    if !(1..=64).contains(&width) {
        return value;
    }
    value.reverse_bits() >> (64 - width)
}

/// Mask covering the low `width` bits
const fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Register parameters of a CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcParams {
    /// Register width in bits
    pub width: u32,
    /// Generator polynomial without the implicit top term
    pub polynomial: u64,
    /// Register value before the first byte
    pub init: u64,
    /// Mask XORed into the register after the last byte
    pub xor_out: u64,
}

impl CrcParams {
    /// Check the width and that every parameter fits in it
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width > 64 || self.width % 8 != 0 {
            return Err(ChecksumError::InvalidWidth { width: self.width });
        }
        let mask = width_mask(self.width);
        for (parameter, value) in [
            ("polynomial", self.polynomial),
            ("init", self.init),
            ("xor_out", self.xor_out),
        ] {
            if value & !mask != 0 {
                return Err(ChecksumError::ParameterOutOfRange {
                    parameter,
                    value,
                    width: self.width,
                });
            }
        }
        Ok(())
    }
}

/// Named CRC algorithms with their published parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrcCatalog {
    /// CRC-8/SMBUS
    Crc8Smbus,
    /// CRC-16/ARC
    Crc16Arc,
    /// CRC-16/IBM-3740 (often called CCITT-FALSE)
    Crc16Ibm3740,
    /// CRC-24/OPENPGP
    Crc24OpenPgp,
    /// CRC-32/ISO-HDLC (zlib, Ethernet)
    Crc32IsoHdlc,
    /// CRC-32/ISCSI (Castagnoli)
    Crc32Iscsi,
    /// CRC-32/BZIP2
    Crc32Bzip2,
    /// CRC-64/ECMA-182
    Crc64Ecma182,
    /// CRC-64/XZ
    Crc64Xz,
}

impl CrcCatalog {
    /// All catalogue entries
    pub const ALL: [CrcCatalog; 9] = [
        Self::Crc8Smbus,
        Self::Crc16Arc,
        Self::Crc16Ibm3740,
        Self::Crc24OpenPgp,
        Self::Crc32IsoHdlc,
        Self::Crc32Iscsi,
        Self::Crc32Bzip2,
        Self::Crc64Ecma182,
        Self::Crc64Xz,
    ];

    /// Catalogue name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Crc8Smbus => "CRC-8/SMBUS",
            Self::Crc16Arc => "CRC-16/ARC",
            Self::Crc16Ibm3740 => "CRC-16/IBM-3740",
            Self::Crc24OpenPgp => "CRC-24/OPENPGP",
            Self::Crc32IsoHdlc => "CRC-32/ISO-HDLC",
            Self::Crc32Iscsi => "CRC-32/ISCSI",
            Self::Crc32Bzip2 => "CRC-32/BZIP2",
            Self::Crc64Ecma182 => "CRC-64/ECMA-182",
            Self::Crc64Xz => "CRC-64/XZ",
        }
    }

    /// Register parameters
    pub const fn params(&self) -> CrcParams {
        let (width, polynomial, init, xor_out) = match self {
            Self::Crc8Smbus => (8, 0x07, 0, 0),
            Self::Crc16Arc => (16, 0x8005, 0, 0),
            Self::Crc16Ibm3740 => (16, 0x1021, 0xFFFF, 0),
            Self::Crc24OpenPgp => (24, 0x86_4CFB, 0xB7_04CE, 0),
            Self::Crc32IsoHdlc => (32, 0x04C1_1DB7, 0xFFFF_FFFF, 0xFFFF_FFFF),
            Self::Crc32Iscsi => (32, 0x1EDC_6F41, 0xFFFF_FFFF, 0xFFFF_FFFF),
            Self::Crc32Bzip2 => (32, 0x04C1_1DB7, 0xFFFF_FFFF, 0xFFFF_FFFF),
            Self::Crc64Ecma182 => (64, 0x42F0_E1EB_A9EA_3693, 0, 0),
            Self::Crc64Xz => (
                64,
                0x42F0_E1EB_A9EA_3693,
                0xFFFF_FFFF_FFFF_FFFF,
                0xFFFF_FFFF_FFFF_FFFF,
            ),
        };
        CrcParams {
            width,
            polynomial,
            init,
            xor_out,
        }
    }

    /// Reflection flags, big-endian output
    pub const fn config(&self) -> EngineConfig {
        let reflected = matches!(
            self,
            Self::Crc16Arc | Self::Crc32IsoHdlc | Self::Crc32Iscsi | Self::Crc64Xz
        );
        EngineConfig::reflected(reflected, reflected)
    }

    /// Published check value over the ASCII string "123456789"
    pub const fn check(&self) -> u64 {
        match self {
            Self::Crc8Smbus => 0xF4,
            Self::Crc16Arc => 0xBB3D,
            Self::Crc16Ibm3740 => 0x29B1,
            Self::Crc24OpenPgp => 0x21_CF02,
            Self::Crc32IsoHdlc => 0xCBF4_3926,
            Self::Crc32Iscsi => 0xE306_9283,
            Self::Crc32Bzip2 => 0xFC89_1918,
            Self::Crc64Ecma182 => 0x6C40_DF5F_0B49_7347,
            Self::Crc64Xz => 0x995D_C9BB_DF19_39FA,
        }
    }
}

/// A configured CRC engine
///
/// The 256-entry lookup table is built on first use and kept for the
/// lifetime of the engine. Concurrent first use builds it exactly once.
#[derive(Debug)]
pub struct Crc {
    name: Cow<'static, str>,
    params: CrcParams,
    config: EngineConfig,
    table: OnceLock<[u64; 256]>,
}

impl Crc {
    /// Build an engine from custom parameters
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        params: CrcParams,
        config: EngineConfig,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            name: name.into(),
            params,
            config,
            table: OnceLock::new(),
        })
    }

    /// Build the engine for a catalogue entry
    pub const fn from_catalog(entry: CrcCatalog) -> Self {
        Self {
            name: Cow::Borrowed(entry.name()),
            params: entry.params(),
            config: entry.config(),
            table: OnceLock::new(),
        }
    }

    /// Catalogue entry with a different output byte order
    pub fn from_catalog_with_order(entry: CrcCatalog, byte_order: ByteOrder) -> Self {
        let mut crc = Self::from_catalog(entry);
        crc.config.byte_order = byte_order;
        crc
    }

    /// Register parameters
    pub fn params(&self) -> &CrcParams {
        &self.params
    }

    /// Whether the lookup table has been built yet
    pub fn is_table_built(&self) -> bool {
        self.table.get().is_some()
    }

    /// Lookup table, built on first access
    pub fn table(&self) -> &[u64; 256] {
        self.table.get_or_init(|| {
            tracing::debug!("Building CRC table for {}", self.name);
            build_table(&self.params)
        })
    }

    /// Compute the check value as an integer
    pub fn checksum(&self, data: &[u8]) -> u64 {
        let mut state = CrcState::new(self);
        state.update(data);
        state.finish()
    }

    fn serialize(&self, register: u64) -> Digest {
        let len = (self.params.width / 8) as usize;
        let bytes = match self.config.byte_order {
            ByteOrder::BigEndian => register.to_be_bytes()[8 - len..].to_vec(),
            ByteOrder::LittleEndian => register.to_le_bytes()[..len].to_vec(),
        };
        Digest::new(bytes)
    }
}

/// Build the MSB-first table: each byte is placed at the top of the
/// register and shifted through eight polynomial steps.
fn build_table(params: &CrcParams) -> [u64; 256] {
    let mask = width_mask(params.width);
    let top_bit = 1u64 << (params.width - 1);
    let mut table = [0u64; 256];

    for (byte, entry) in table.iter_mut().enumerate() {
        let mut register = ((byte as u64) << (params.width - 8)) & mask;
        for _ in 0..8 {
            register = if register & top_bit != 0 {
                (register << 1) ^ params.polynomial
            } else {
                register << 1
            };
            register &= mask;
        }
        *entry = register;
    }

    table
}

/// Running register of one CRC computation
struct CrcState<'a> {
    crc: &'a Crc,
    table: &'a [u64; 256],
    register: u64,
}

impl<'a> CrcState<'a> {
    fn new(crc: &'a Crc) -> Self {
        Self {
            crc,
            table: crc.table(),
            register: crc.params.init,
        }
    }

    fn update(&mut self, data: &[u8]) {
        let shift = self.crc.params.width - 8;
        let mask = width_mask(self.crc.params.width);
        let reflect_input = self.crc.config.reflect_input;

        for &byte in data {
            let byte = if reflect_input { byte.reverse_bits() } else { byte };
            let index = ((self.register >> shift) as u8 ^ byte) as usize;
            self.register = ((self.register << 8) ^ self.table[index]) & mask;
        }
    }

    fn finish(&self) -> u64 {
        let mut register = self.register;
        if self.crc.config.reflect_output {
            register = reflect(register, self.crc.params.width);
        }
        register ^ self.crc.params.xor_out
    }
}

impl StreamHasher for CrcState<'_> {
    fn update(&mut self, data: &[u8]) {
        CrcState::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Digest {
        self.crc.serialize(self.finish())
    }
}

impl HashEngine for Crc {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn output_len(&self) -> usize {
        (self.params.width / 8) as usize
    }

    fn hasher(&self) -> Box<dyn StreamHasher + '_> {
        Box::new(CrcState::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CHECK_INPUT: &[u8] = b"123456789";

    #[test]
    fn test_catalog_check_values() {
        for entry in CrcCatalog::ALL {
            let crc = Crc::from_catalog(entry);
            assert_eq!(crc.checksum(CHECK_INPUT), entry.check(), "{}", entry.name());
            entry.params().validate().unwrap();
        }
    }

    #[test]
    fn test_crc64_xz_digest() {
        let crc = Crc::from_catalog(CrcCatalog::Crc64Xz);
        let digest = crc.compute(CHECK_INPUT);
        assert_eq!(digest.to_hex(), "995dc9bbdf1939fa");
        assert_eq!(digest.len(), 8);
    }

    #[test]
    fn test_crc32_known_string() {
        let crc = Crc::from_catalog(CrcCatalog::Crc32IsoHdlc);
        assert_eq!(crc.checksum(b"hello world"), 0x0d4a_1185);
    }

    #[test]
    fn test_empty_input_runs_pipeline() {
        // init passes straight through to the final XOR
        let ibm = Crc::from_catalog(CrcCatalog::Crc16Ibm3740);
        assert_eq!(ibm.compute(b"").to_hex(), "ffff");

        let pgp = Crc::from_catalog(CrcCatalog::Crc24OpenPgp);
        assert_eq!(pgp.compute(b"").to_hex(), "b704ce");

        let xz = Crc::from_catalog(CrcCatalog::Crc64Xz);
        assert_eq!(xz.compute(b"").to_hex(), "0000000000000000");
    }

    #[test]
    fn test_table_is_lazy() {
        let crc = Crc::from_catalog(CrcCatalog::Crc32IsoHdlc);
        assert!(!crc.is_table_built());
        crc.compute(b"x");
        assert!(crc.is_table_built());

        let table = crc.table();
        assert_eq!(table[0], 0);
        assert_eq!(table[1], 0x04C1_1DB7);
        assert_eq!(table[255], 0xB1F7_40B4);
        assert!(std::ptr::eq(table, crc.table()));
    }

    #[test]
    fn test_concurrent_first_use_builds_one_table() {
        let crc = Crc::from_catalog(CrcCatalog::Crc64Ecma182);
        let tables: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| crc.table() as *const _ as usize))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(tables.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_byte_order_of_digest() {
        let big = Crc::from_catalog(CrcCatalog::Crc32IsoHdlc);
        let little = Crc::from_catalog_with_order(CrcCatalog::Crc32IsoHdlc, ByteOrder::LittleEndian);
        assert_eq!(big.compute(CHECK_INPUT).to_hex(), "cbf43926");
        assert_eq!(little.compute(CHECK_INPUT).to_hex(), "2639f4cb");

        let pgp = Crc::from_catalog_with_order(CrcCatalog::Crc24OpenPgp, ByteOrder::LittleEndian);
        assert_eq!(pgp.compute(CHECK_INPUT).to_hex(), "02cf21");
    }

    #[test]
    fn test_rejects_unaligned_width() {
        for width in [0, 12, 65, 72] {
            let params = CrcParams {
                width,
                polynomial: 0x3,
                init: 0,
                xor_out: 0,
            };
            let err = Crc::new("bad", params, EngineConfig::new()).unwrap_err();
            assert!(matches!(err, ChecksumError::InvalidWidth { width: w } if w == width));
        }
    }

    #[test]
    fn test_rejects_oversized_parameters() {
        let params = CrcParams {
            width: 16,
            polynomial: 0x1_1021,
            init: 0,
            xor_out: 0,
        };
        let err = Crc::new("bad", params, EngineConfig::new()).unwrap_err();
        assert!(matches!(
            err,
            ChecksumError::ParameterOutOfRange { parameter: "polynomial", .. }
        ));

        let params = CrcParams {
            width: 8,
            polynomial: 0x07,
            init: 0,
            xor_out: 0x100,
        };
        assert!(Crc::new("bad", params, EngineConfig::new()).is_err());
    }

    #[test]
    fn test_custom_matches_catalog() {
        let entry = CrcCatalog::Crc32Iscsi;
        let custom = Crc::new("castagnoli", entry.params(), entry.config()).unwrap();
        assert_eq!(custom.checksum(CHECK_INPUT), entry.check());
        assert_eq!(custom.name(), "castagnoli");
    }

    #[test]
    fn test_reflect_examples() {
        assert_eq!(reflect(0b0000_0001, 8), 0b1000_0000);
        assert_eq!(reflect(0x0001, 16), 0x8000);
        assert_eq!(reflect(0x04C1_1DB7, 32), 0xEDB8_8320);
        assert_eq!(reflect(0x42F0_E1EB_A9EA_3693, 64), 0xC96C_5795_D787_0F42);
    }

    #[test]
    fn test_reflect_out_of_range_width_is_identity() {
        assert_eq!(reflect(0x1234, 0), 0x1234);
        assert_eq!(reflect(0x1234, 65), 0x1234);
        assert_eq!(reflect(u64::MAX, u32::MAX), u64::MAX);
        assert_eq!(reflect(0b1, 1), 0b1);
    }

    proptest! {
        #[test]
        fn prop_reflect_twice_is_identity(value in any::<u64>(), width in prop::sample::select(vec![8u32, 16, 32, 64])) {
            let masked = value & width_mask(width);
            prop_assert_eq!(reflect(reflect(masked, width), width), masked);
        }

        #[test]
        fn prop_compute_is_deterministic(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let crc = Crc::from_catalog(CrcCatalog::Crc64Xz);
            prop_assert_eq!(crc.compute(&data), crc.compute(&data));
        }

        #[test]
        fn prop_streaming_matches_one_shot(data in prop::collection::vec(any::<u8>(), 0..512), split in 0usize..512) {
            let crc = Crc::from_catalog(CrcCatalog::Crc16Arc);
            let split = split.min(data.len());
            let mut hasher = crc.hasher();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            prop_assert_eq!(hasher.finalize(), crc.compute(&data));
        }
    }
}
