//! # SmartSum - Non-cryptographic Checksums and Cache Validators
//!
//! SmartSum provides table-driven CRC engines, FNV-1a from 32 up to 1024
//! bits, an incremental checksum accumulator, and cache validators that
//! combine timestamps with checksums into a None/Weak/Strong token.
//!
//! ## Features
//!
//! - **CRC**: any width from 8 to 64 bits (multiple of 8), reflected or not,
//!   with a lazily built 256-entry lookup table
//! - **FNV-1a**: 32, 64, 128, 256, 512 and 1024 bits
//! - **Byte encoding**: primitives and strings to ordered byte sequences
//! - **Checksum accumulator**: append data, digest computed once and cached
//! - **Cache validators**: creation/modification timestamps plus checksums
//!
//! ## Quick Start
//!
//! ```no_run
//! use smartsum::hash::Checksum;
//! use smartsum::config::ChecksumAlgorithm;
//!
//! let mut checksum = Checksum::from_bytes(b"hello".to_vec(), ChecksumAlgorithm::Crc32);
//! checksum.append(b" world");
//! println!("{}", checksum.to_hex());
//! ```
//!
//! ## Cache Validation
//!
//! ```no_run
//! use smartsum::cache::{CacheValidator, ChecksumMethod};
//! use chrono::Utc;
//!
//! let validator = CacheValidator::new(
//!     Utc::now(),
//!     None,
//!     Some("payload".into()),
//!     ChecksumMethod::Combined,
//! )
//! .unwrap();
//!
//! println!("{} {}", validator.strength(), validator.digest());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod config;
pub mod encode;
pub mod error;
pub mod hash;

// Re-export commonly used types
pub use cache::{CacheValidator, ChecksumMethod, Strength};
pub use config::ChecksumAlgorithm;
pub use error::{ChecksumError, Result};
pub use hash::{Checksum, Digest, HashEngine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use smartsum::prelude::*;
    //! ```

    pub use crate::cache::{process_default, CacheValidator, ChecksumMethod, ReferenceOptions, Strength};
    pub use crate::config::ChecksumAlgorithm;
    pub use crate::encode::{encode, encode_str, ByteOrder, Scalar, TextEncoding};
    pub use crate::error::{ChecksumError, Result};
    pub use crate::hash::{
        hash_file, verify_files_match, Checksum, Crc, CrcCatalog, CrcParams, Digest, EngineConfig,
        Fnv, FnvWidth, HashEngine,
    };
}
