//! Incremental checksum accumulator
//!
//! Collects raw bytes and computes the digest lazily through a pluggable
//! [`HashEngine`]. Appending drops the cached digest.

use crate::config::ChecksumAlgorithm;
use crate::encode::{encode_str, ByteOrder, Scalar, TextEncoding};
use crate::hash::{Crc, CrcCatalog, Digest, Fnv, FnvWidth, HashEngine};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

static CRC8: Crc = Crc::from_catalog(CrcCatalog::Crc8Smbus);
static CRC16: Crc = Crc::from_catalog(CrcCatalog::Crc16Arc);
static CRC16_CCITT: Crc = Crc::from_catalog(CrcCatalog::Crc16Ibm3740);
static CRC24: Crc = Crc::from_catalog(CrcCatalog::Crc24OpenPgp);
static CRC32: Crc = Crc::from_catalog(CrcCatalog::Crc32IsoHdlc);
static CRC32C: Crc = Crc::from_catalog(CrcCatalog::Crc32Iscsi);
static CRC32_BZIP2: Crc = Crc::from_catalog(CrcCatalog::Crc32Bzip2);
static CRC64: Crc = Crc::from_catalog(CrcCatalog::Crc64Ecma182);
static CRC64_XZ: Crc = Crc::from_catalog(CrcCatalog::Crc64Xz);
static FNV32: Fnv = Fnv::new(FnvWidth::W32);
static FNV64: Fnv = Fnv::new(FnvWidth::W64);
static FNV128: Fnv = Fnv::new(FnvWidth::W128);
static FNV256: Fnv = Fnv::new(FnvWidth::W256);
static FNV512: Fnv = Fnv::new(FnvWidth::W512);
static FNV1024: Fnv = Fnv::new(FnvWidth::W1024);

impl ChecksumAlgorithm {
    /// Process-wide engine for this algorithm.
    ///
    /// CRC tables are built on first use and shared by every caller.
    pub fn engine(&self) -> &'static dyn HashEngine {
        match self {
            Self::Crc8 => &CRC8,
            Self::Crc16 => &CRC16,
            Self::Crc16Ccitt => &CRC16_CCITT,
            Self::Crc24 => &CRC24,
            Self::Crc32 => &CRC32,
            Self::Crc32c => &CRC32C,
            Self::Crc32Bzip2 => &CRC32_BZIP2,
            Self::Crc64 => &CRC64,
            Self::Crc64Xz => &CRC64_XZ,
            Self::Fnv32 => &FNV32,
            Self::Fnv64 => &FNV64,
            Self::Fnv128 => &FNV128,
            Self::Fnv256 => &FNV256,
            Self::Fnv512 => &FNV512,
            Self::Fnv1024 => &FNV1024,
        }
    }

    /// Fresh engine for this algorithm with the digest in `byte_order`
    pub fn engine_with_order(&self, byte_order: ByteOrder) -> Arc<dyn HashEngine> {
        let crc = |entry: CrcCatalog| -> Arc<dyn HashEngine> {
            Arc::new(Crc::from_catalog_with_order(entry, byte_order))
        };
        let fnv = |width: FnvWidth| -> Arc<dyn HashEngine> {
            Arc::new(Fnv::with_byte_order(width, byte_order))
        };
        match self {
            Self::Crc8 => crc(CrcCatalog::Crc8Smbus),
            Self::Crc16 => crc(CrcCatalog::Crc16Arc),
            Self::Crc16Ccitt => crc(CrcCatalog::Crc16Ibm3740),
            Self::Crc24 => crc(CrcCatalog::Crc24OpenPgp),
            Self::Crc32 => crc(CrcCatalog::Crc32IsoHdlc),
            Self::Crc32c => crc(CrcCatalog::Crc32Iscsi),
            Self::Crc32Bzip2 => crc(CrcCatalog::Crc32Bzip2),
            Self::Crc64 => crc(CrcCatalog::Crc64Ecma182),
            Self::Crc64Xz => crc(CrcCatalog::Crc64Xz),
            Self::Fnv32 => fnv(FnvWidth::W32),
            Self::Fnv64 => fnv(FnvWidth::W64),
            Self::Fnv128 => fnv(FnvWidth::W128),
            Self::Fnv256 => fnv(FnvWidth::W256),
            Self::Fnv512 => fnv(FnvWidth::W512),
            Self::Fnv1024 => fnv(FnvWidth::W1024),
        }
    }
}

#[derive(Clone)]
enum EngineRef {
    Builtin(ChecksumAlgorithm),
    Custom(Arc<dyn HashEngine>),
}

impl EngineRef {
    fn get(&self) -> &dyn HashEngine {
        match self {
            Self::Builtin(algorithm) => algorithm.engine(),
            Self::Custom(engine) => engine.as_ref(),
        }
    }
}

/// Mutable byte accumulator with a lazily computed digest
///
/// Equality and hashing follow the hex digest, not the raw bytes: two
/// different payloads that hash identically are equal checksums.
///
/// A single instance is not meant to be appended to from several threads;
/// `append` takes `&mut self`, so the borrow checker serializes it.
#[derive(Clone)]
pub struct Checksum {
    bytes: Vec<u8>,
    engine: EngineRef,
    digest: OnceLock<Digest>,
}

impl Checksum {
    /// Empty accumulator
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self::from_bytes(Vec::new(), algorithm)
    }

    /// Seed with raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, algorithm: ChecksumAlgorithm) -> Self {
        Self {
            bytes: bytes.into(),
            engine: EngineRef::Builtin(algorithm),
            digest: OnceLock::new(),
        }
    }

    /// Seed with a scalar encoded in the engine's byte order
    pub fn from_scalar(value: impl Into<Scalar>, algorithm: ChecksumAlgorithm) -> Self {
        let bytes = value.into().encode(algorithm.engine().byte_order());
        Self::from_bytes(bytes, algorithm)
    }

    /// Seed with text in the given encoding, without a byte-order mark
    pub fn from_text(text: &str, encoding: TextEncoding, algorithm: ChecksumAlgorithm) -> Self {
        Self::from_bytes(encode_str(text, encoding, false), algorithm)
    }

    /// Seed with raw bytes and compute through a caller-supplied engine
    pub fn with_engine(bytes: impl Into<Vec<u8>>, engine: Arc<dyn HashEngine>) -> Self {
        Self {
            bytes: bytes.into(),
            engine: EngineRef::Custom(engine),
            digest: OnceLock::new(),
        }
    }

    /// Append raw bytes. Empty input leaves the cached digest alone.
    pub fn append(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.bytes.extend_from_slice(data);
        self.digest = OnceLock::new();
    }

    /// Append a scalar in the engine's byte order
    pub fn append_scalar(&mut self, value: impl Into<Scalar>) {
        let bytes = value.into().encode(self.engine().byte_order());
        self.append(&bytes);
    }

    /// Append text without a byte-order mark
    pub fn append_text(&mut self, text: &str, encoding: TextEncoding) {
        self.append(&encode_str(text, encoding, false));
    }

    /// Append another accumulator's raw bytes
    pub fn append_checksum(&mut self, other: &Checksum) {
        self.append(&other.bytes);
    }

    /// New accumulator holding this one's bytes followed by `other`'s.
    ///
    /// Order matters: `a.combine(&b)` and `b.combine(&a)` generally differ.
    pub fn combine(&self, other: &Checksum) -> Checksum {
        let mut combined = self.clone();
        combined.append_checksum(other);
        combined
    }

    /// Digest of the current bytes, computed on first access
    pub fn digest(&self) -> &Digest {
        self.digest.get_or_init(|| {
            let engine = self.engine();
            tracing::trace!("Computing {} over {} bytes", engine.name(), self.bytes.len());
            engine.compute(&self.bytes)
        })
    }

    /// Whether the digest is currently cached
    pub fn is_computed(&self) -> bool {
        self.digest.get().is_some()
    }

    /// Lowercase hex of the digest
    pub fn to_hex(&self) -> String {
        self.digest().to_hex()
    }

    /// Accumulated raw bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of accumulated bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when nothing has been accumulated
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Built-in algorithm selector, `None` for custom engines
    pub fn algorithm(&self) -> Option<ChecksumAlgorithm> {
        match self.engine {
            EngineRef::Builtin(algorithm) => Some(algorithm),
            EngineRef::Custom(_) => None,
        }
    }

    /// Engine used for the digest
    pub fn engine(&self) -> &dyn HashEngine {
        self.engine.get()
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new(ChecksumAlgorithm::default())
    }
}

impl PartialEq for Checksum {
    fn eq(&self, other: &Self) -> bool {
        self.to_hex() == other.to_hex()
    }
}

impl Eq for Checksum {}

impl Hash for Checksum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_hex().hash(state);
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checksum")
            .field("engine", &self.engine().name())
            .field("len", &self.bytes.len())
            .field("digest", &self.digest.get().map(Digest::to_hex))
            .finish()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digest())
    }
}
