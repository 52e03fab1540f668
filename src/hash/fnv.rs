//! FNV-1a hashing from 32 to 1024 bits
//!
//! Each byte is XORed into the low end of the state, which is then
//! multiplied by the width's prime modulo `2^width`. The prime and offset
//! basis are fixed per width. Widths above 64 bits go through [`WideUint`];
//! 32 and 64 bit use native wrapping multiplication, which is the same
//! arithmetic.

use crate::encode::ByteOrder;
use crate::error::{ChecksumError, Result};
use crate::hash::wide::WideUint;
use crate::hash::{Digest, EngineConfig, HashEngine, StreamHasher};

/// Supported FNV output widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FnvWidth {
    /// 32 bits
    W32,
    /// 64 bits
    W64,
    /// 128 bits
    W128,
    /// 256 bits
    W256,
    /// 512 bits
    W512,
    /// 1024 bits
    W1024,
}

impl FnvWidth {
    /// All widths, narrowest first
    pub const ALL: [FnvWidth; 6] = [
        Self::W32,
        Self::W64,
        Self::W128,
        Self::W256,
        Self::W512,
        Self::W1024,
    ];

    /// Width for a bit count
    pub fn from_bits(bits: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.bits() == bits)
            .ok_or_else(|| ChecksumError::UnsupportedAlgorithm(format!("FNV-{}", bits)))
    }

    /// Output size in bits
    pub const fn bits(&self) -> u32 {
        match self {
            Self::W32 => 32,
            Self::W64 => 64,
            Self::W128 => 128,
            Self::W256 => 256,
            Self::W512 => 512,
            Self::W1024 => 1024,
        }
    }

    /// Algorithm name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::W32 => "FNV-1a/32",
            Self::W64 => "FNV-1a/64",
            Self::W128 => "FNV-1a/128",
            Self::W256 => "FNV-1a/256",
            Self::W512 => "FNV-1a/512",
            Self::W1024 => "FNV-1a/1024",
        }
    }

    /// Prime as little-endian limbs
    pub const fn prime(&self) -> &'static [u64] {
        match self {
            Self::W32 => &PRIME_32,
            Self::W64 => &PRIME_64,
            Self::W128 => &PRIME_128,
            Self::W256 => &PRIME_256,
            Self::W512 => &PRIME_512,
            Self::W1024 => &PRIME_1024,
        }
    }

    /// Offset basis as little-endian limbs
    pub const fn offset_basis(&self) -> &'static [u64] {
        match self {
            Self::W32 => &BASIS_32,
            Self::W64 => &BASIS_64,
            Self::W128 => &BASIS_128,
            Self::W256 => &BASIS_256,
            Self::W512 => &BASIS_512,
            Self::W1024 => &BASIS_1024,
        }
    }
}

const PRIME_32: [u64; 1] = [0x0100_0193];
const BASIS_32: [u64; 1] = [0x811C_9DC5];

const PRIME_64: [u64; 1] = [0x0000_0100_0000_01B3];
const BASIS_64: [u64; 1] = [0xCBF2_9CE4_8422_2325];

const PRIME_128: [u64; 2] = [0x0000_0000_0000_013B, 0x0000_0000_0100_0000];
const BASIS_128: [u64; 2] = [0x62B8_2175_6295_C58D, 0x6C62_272E_07BB_0142];

const PRIME_256: [u64; 4] = [0x0000_0000_0000_0163, 0, 0x0000_0100_0000_0000, 0];
const BASIS_256: [u64; 4] = [
    0x1023_B4C8_CAEE_0535,
    0xC8B1_5368_47B6_BBB3,
    0x2D98_C384_C4E5_76CC,
    0xDD26_8DBC_AAC5_5036,
];

const PRIME_512: [u64; 8] = [0x0000_0000_0000_0157, 0, 0, 0, 0, 0x0000_0000_0100_0000, 0, 0];
const BASIS_512: [u64; 8] = [
    0xAC98_2AAC_4AFE_9FD9,
    0x1820_3641_5F56_E34B,
    0x2EA7_9BC9_42DB_E7CE,
    0xE948_F68A_34C1_92F6,
    0x0000_0000_0000_0D21,
    0xAC87_D059_C900_0000,
    0xDCA1_E50F_3099_90AC,
    0xB86D_B0B1_171F_4416,
];

const PRIME_1024: [u64; 16] = [
    0x0000_0000_0000_018D,
    0,
    0,
    0,
    0,
    0,
    0,
    0,
    0,
    0,
    0x0000_0100_0000_0000,
    0,
    0,
    0,
    0,
    0,
];
const BASIS_1024: [u64; 16] = [
    0xAFF4_B16C_71EE_90B3,
    0x6BDE_8CC9_C6A9_3B21,
    0x555F_256C_C005_AE55,
    0xEB6E_7380_2734_510A,
    0x0000_0000_0004_C6D7,
    0,
    0,
    0,
    0,
    0,
    0x9A21_D900_0000_0000,
    0x6C3B_F34E_DA36_74DA,
    0x4B29_FC42_23FD_ADA1,
    0x32E5_6D5A_5910_28B7,
    0x005F_7A76_758E_CC4D,
    0,
];

/// FNV-1a engine for one width
#[derive(Debug, Clone)]
pub struct Fnv {
    width: FnvWidth,
    config: EngineConfig,
    native: bool,
}

impl Fnv {
    /// Engine for `width`, big-endian digest
    pub const fn new(width: FnvWidth) -> Self {
        Self {
            width,
            config: EngineConfig::new(),
            native: true,
        }
    }

    /// Engine that always uses multi-limb arithmetic, even for 32/64 bit
    pub const fn multi_limb(width: FnvWidth) -> Self {
        Self {
            width,
            config: EngineConfig::new(),
            native: false,
        }
    }

    /// Engine for `width` with the digest written in `byte_order`
    pub const fn with_byte_order(width: FnvWidth, byte_order: ByteOrder) -> Self {
        Self {
            width,
            config: EngineConfig::new().with_byte_order(byte_order),
            native: true,
        }
    }

    /// Output width
    pub fn width(&self) -> FnvWidth {
        self.width
    }
}

enum FnvState {
    Native32(u32),
    Native64(u64),
    Wide { hash: WideUint, prime: WideUint },
}

struct FnvHasher {
    state: FnvState,
    byte_order: ByteOrder,
}

impl StreamHasher for FnvHasher {
    fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            FnvState::Native32(hash) => {
                for &byte in data {
                    *hash ^= u32::from(byte);
                    *hash = hash.wrapping_mul(PRIME_32[0] as u32);
                }
            }
            FnvState::Native64(hash) => {
                for &byte in data {
                    *hash ^= u64::from(byte);
                    *hash = hash.wrapping_mul(PRIME_64[0]);
                }
            }
            FnvState::Wide { hash, prime } => {
                for &byte in data {
                    hash.xor_low_byte(byte);
                    hash.wrapping_mul_assign(prime);
                }
            }
        }
    }

    fn finalize(self: Box<Self>) -> Digest {
        let FnvHasher { state, byte_order } = *self;
        let mut bytes = match state {
            FnvState::Native32(hash) => hash.to_be_bytes().to_vec(),
            FnvState::Native64(hash) => hash.to_be_bytes().to_vec(),
            FnvState::Wide { hash, .. } => hash.to_be_bytes(),
        };
        if byte_order == ByteOrder::LittleEndian {
            bytes.reverse();
        }
        Digest::new(bytes)
    }
}

impl HashEngine for Fnv {
    fn name(&self) -> &str {
        self.width.name()
    }

    fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn output_len(&self) -> usize {
        (self.width.bits() / 8) as usize
    }

    fn hasher(&self) -> Box<dyn StreamHasher + '_> {
        let state = match (self.native, self.width) {
            (true, FnvWidth::W32) => FnvState::Native32(BASIS_32[0] as u32),
            (true, FnvWidth::W64) => FnvState::Native64(BASIS_64[0]),
            (_, width) => FnvState::Wide {
                hash: WideUint::from_limbs(width.offset_basis(), width.bits()),
                prime: WideUint::from_limbs(width.prime(), width.bits()),
            },
        };
        Box::new(FnvHasher {
            state,
            byte_order: self.config.byte_order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hex(width: FnvWidth, data: &[u8]) -> String {
        Fnv::new(width).compute(data).to_hex()
    }

    #[test]
    fn test_empty_input_is_offset_basis() {
        assert_eq!(hex(FnvWidth::W64, b""), "cbf29ce484222325");
        assert_eq!(
            Fnv::new(FnvWidth::W64).compute(b"").as_bytes(),
            &0xCBF2_9CE4_8422_2325u64.to_be_bytes()
        );
        assert_eq!(hex(FnvWidth::W32, b""), "811c9dc5");
        assert_eq!(hex(FnvWidth::W128, b""), "6c62272e07bb014262b821756295c58d");
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(hex(FnvWidth::W32, b"a"), "e40c292c");
        assert_eq!(hex(FnvWidth::W32, b"foobar"), "bf9cf968");
        assert_eq!(hex(FnvWidth::W64, b"a"), "af63dc4c8601ec8c");
        assert_eq!(hex(FnvWidth::W64, b"foobar"), "85944171f73967e8");
        assert_eq!(hex(FnvWidth::W128, b"a"), "d228cb696f1a8caf78912b704e4a8964");
        assert_eq!(
            hex(FnvWidth::W256, b"foobar"),
            "b055ea2f306cadad4f0f81c02d3889dc32453dad5ae35b753ba1a91084af3428"
        );
    }

    #[test]
    fn test_wide_vectors() {
        assert_eq!(
            hex(FnvWidth::W512, b"a"),
            "e43a992dc8fc5ad7de493e3d696d6f85d64326ec07000000000000000011986f\
             90c2532caf5be7d88291baa894a395225328b196bd6a8a643fe12cd87b27ff88"
        );
        let digest = hex(FnvWidth::W1024, b"a");
        assert!(digest.starts_with("000000000000000098d7c19fbce653df"));
        assert!(digest.ends_with("1a491dbccc21ad06648d09a5c8cf5a78482054e91470b33dde77252caef695aa"));
    }

    #[test]
    fn test_little_endian_digest_is_reversed() {
        let little = Fnv::with_byte_order(FnvWidth::W64, ByteOrder::LittleEndian);
        assert_eq!(little.compute(b"a").to_hex(), "8cec01864cdc63af");
        assert_eq!(little.byte_order(), ByteOrder::LittleEndian);

        let big = Fnv::new(FnvWidth::W128).compute(b"a");
        let mut reversed = Fnv::with_byte_order(FnvWidth::W128, ByteOrder::LittleEndian)
            .compute(b"a")
            .into_bytes();
        reversed.reverse();
        assert_eq!(reversed, big.into_bytes());
    }

    #[test]
    fn test_output_lengths() {
        for width in FnvWidth::ALL {
            let fnv = Fnv::new(width);
            let digest = fnv.compute(b"length");
            assert_eq!(digest.len(), fnv.output_len());
            assert_eq!(digest.len() * 8, width.bits() as usize);
        }
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(FnvWidth::from_bits(256).unwrap(), FnvWidth::W256);
        assert!(FnvWidth::from_bits(48).is_err());
    }

    proptest! {
        #[test]
        fn prop_native_matches_multi_limb(data in prop::collection::vec(any::<u8>(), 0..256)) {
            for width in [FnvWidth::W32, FnvWidth::W64] {
                prop_assert_eq!(
                    Fnv::new(width).compute(&data),
                    Fnv::multi_limb(width).compute(&data)
                );
            }
        }

        #[test]
        fn prop_streaming_matches_one_shot(data in prop::collection::vec(any::<u8>(), 0..128), split in 0usize..128) {
            let fnv = Fnv::new(FnvWidth::W256);
            let split = split.min(data.len());
            let mut hasher = fnv.hasher();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            prop_assert_eq!(hasher.finalize(), fnv.compute(&data));
        }
    }
}
