//! Configuration settings for SmartSum
//!
//! Defines the algorithm selector, CLI arguments, and defaults.

use crate::cache::ChecksumMethod;
use crate::encode::{ByteOrder, TextEncoding};
use crate::error::{ChecksumError, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// SmartSum - CRC/FNV checksums and cache validators
#[derive(Parser, Debug, Clone)]
#[command(name = "smartsum")]
#[command(author = "SmartCopy Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Table-driven CRC, wide FNV and cache validators")]
#[command(long_about = r#"
SmartSum computes non-cryptographic checksums and cache validators.

Features:
  - Table-driven CRC (8 to 64 bit, custom parameters)
  - FNV-1a from 32 up to 1024 bits
  - Cache validators combining file timestamps with checksums

Examples:
  smartsum hash data.bin                       # CRC-64/XZ, hex
  smartsum hash a.bin b.bin -a fnv128 -f base64
  smartsum crc data.bin --width 16 --poly 0x1021 --init 0xffff
  smartsum validate data.bin --method combined --max-bytes 64K
"#)]
pub struct CliArgs {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for reports
    #[arg(long, value_enum, default_value = "text", global = true)]
    pub output_format: OutputFormat,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Checksum one or more files
    #[command(name = "hash")]
    Hash {
        /// Files to hash
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Checksum algorithm
        #[arg(short, long, value_enum, default_value = "crc64-xz")]
        algorithm: ChecksumAlgorithm,
        /// Digest text form
        #[arg(short, long, value_enum, default_value = "hex")]
        format: DigestFormat,
        /// Digest byte order
        #[arg(long, value_enum, default_value = "big")]
        byte_order: ByteOrder,
    },

    /// Checksum a string
    #[command(name = "text")]
    Text {
        /// Text to hash
        text: String,
        /// Checksum algorithm
        #[arg(short, long, value_enum, default_value = "crc64-xz")]
        algorithm: ChecksumAlgorithm,
        /// Text encoding
        #[arg(short, long, value_enum, default_value = "utf8")]
        encoding: TextEncoding,
        /// Prefix the byte-order mark
        #[arg(long)]
        bom: bool,
        /// Digest text form
        #[arg(short, long, value_enum, default_value = "hex")]
        format: DigestFormat,
    },

    /// Checksum a file with custom CRC parameters
    #[command(name = "crc")]
    Crc {
        /// File to hash
        path: PathBuf,
        /// Register width in bits (multiple of 8, at most 64)
        #[arg(long)]
        width: u32,
        /// Polynomial (0x-prefixed hex or decimal)
        #[arg(long, value_parser = parse_u64)]
        poly: u64,
        /// Initial register value
        #[arg(long, default_value = "0", value_parser = parse_u64)]
        init: u64,
        /// Final XOR mask
        #[arg(long, default_value = "0", value_parser = parse_u64)]
        xor_out: u64,
        /// Reflect input bytes
        #[arg(long)]
        reflect_in: bool,
        /// Reflect the final register
        #[arg(long)]
        reflect_out: bool,
        /// Digest byte order
        #[arg(long, value_enum, default_value = "big")]
        byte_order: ByteOrder,
    },

    /// Derive a cache validator from a file
    #[command(name = "validate")]
    Validate {
        /// Reference file
        path: PathBuf,
        /// Checksum derivation method
        #[arg(short, long, value_enum, default_value = "default")]
        method: ChecksumMethod,
        /// Bytes of content to read (e.g., 64K); 0 uses the file name only
        #[arg(long, default_value = "1M", value_name = "SIZE")]
        max_bytes: String,
        /// Checksum algorithm
        #[arg(short, long, value_enum, default_value = "crc64-xz")]
        algorithm: ChecksumAlgorithm,
    },

    /// Check two files have identical checksums
    #[command(name = "verify")]
    Verify {
        /// First file
        source: PathBuf,
        /// Second file
        destination: PathBuf,
        /// Checksum algorithm
        #[arg(short, long, value_enum, default_value = "crc64-xz")]
        algorithm: ChecksumAlgorithm,
    },

    /// List supported algorithms
    #[command(name = "algorithms")]
    Algorithms,

    /// Measure throughput of every algorithm
    #[command(name = "benchmark")]
    Benchmark {
        /// Buffer size to hash
        #[arg(long, default_value = "4M")]
        size: String,
    },
}

/// Checksum algorithm selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumAlgorithm {
    /// CRC-8/SMBUS
    #[value(name = "crc8")]
    Crc8,
    /// CRC-16/ARC
    #[value(name = "crc16")]
    Crc16,
    /// CRC-16/IBM-3740
    #[value(name = "crc16-ccitt")]
    Crc16Ccitt,
    /// CRC-24/OPENPGP
    #[value(name = "crc24")]
    Crc24,
    /// CRC-32/ISO-HDLC
    #[value(name = "crc32")]
    Crc32,
    /// CRC-32/ISCSI (Castagnoli)
    #[value(name = "crc32c")]
    Crc32c,
    /// CRC-32/BZIP2
    #[value(name = "crc32-bzip2")]
    Crc32Bzip2,
    /// CRC-64/ECMA-182
    #[value(name = "crc64")]
    Crc64,
    /// CRC-64/XZ
    #[default]
    #[value(name = "crc64-xz")]
    Crc64Xz,
    /// FNV-1a 32-bit
    #[value(name = "fnv32")]
    Fnv32,
    /// FNV-1a 64-bit
    #[value(name = "fnv64")]
    Fnv64,
    /// FNV-1a 128-bit
    #[value(name = "fnv128")]
    Fnv128,
    /// FNV-1a 256-bit
    #[value(name = "fnv256")]
    Fnv256,
    /// FNV-1a 512-bit
    #[value(name = "fnv512")]
    Fnv512,
    /// FNV-1a 1024-bit
    #[value(name = "fnv1024")]
    Fnv1024,
}

impl ChecksumAlgorithm {
    /// Every selector
    pub const ALL: [ChecksumAlgorithm; 15] = [
        Self::Crc8,
        Self::Crc16,
        Self::Crc16Ccitt,
        Self::Crc24,
        Self::Crc32,
        Self::Crc32c,
        Self::Crc32Bzip2,
        Self::Crc64,
        Self::Crc64Xz,
        Self::Fnv32,
        Self::Fnv64,
        Self::Fnv128,
        Self::Fnv256,
        Self::Fnv512,
        Self::Fnv1024,
    ];

    /// Get the output size in bytes
    pub fn output_size(&self) -> usize {
        match self {
            Self::Crc8 => 1,
            Self::Crc16 | Self::Crc16Ccitt => 2,
            Self::Crc24 => 3,
            Self::Crc32 | Self::Crc32c | Self::Crc32Bzip2 | Self::Fnv32 => 4,
            Self::Crc64 | Self::Crc64Xz | Self::Fnv64 => 8,
            Self::Fnv128 => 16,
            Self::Fnv256 => 32,
            Self::Fnv512 => 64,
            Self::Fnv1024 => 128,
        }
    }

    /// Selector name as accepted on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Self::Crc8 => "crc8",
            Self::Crc16 => "crc16",
            Self::Crc16Ccitt => "crc16-ccitt",
            Self::Crc24 => "crc24",
            Self::Crc32 => "crc32",
            Self::Crc32c => "crc32c",
            Self::Crc32Bzip2 => "crc32-bzip2",
            Self::Crc64 => "crc64",
            Self::Crc64Xz => "crc64-xz",
            Self::Fnv32 => "fnv32",
            Self::Fnv64 => "fnv64",
            Self::Fnv128 => "fnv128",
            Self::Fnv256 => "fnv256",
            Self::Fnv512 => "fnv512",
            Self::Fnv1024 => "fnv1024",
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.id() == wanted)
            .ok_or_else(|| ChecksumError::UnsupportedAlgorithm(s.to_string()))
    }
}

/// Text form of a printed digest
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestFormat {
    /// Lowercase hexadecimal
    #[default]
    Hex,
    /// Standard base64
    Base64,
    /// URL-safe base64 without padding
    #[value(name = "base64-url")]
    Base64Url,
    /// Binary digits
    Binary,
}

/// Output format for reports
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
}

/// Parse human-readable size string to bytes
pub fn parse_size(size: &str) -> std::result::Result<u64, String> {
    let size = size.trim().to_uppercase();

    if size.is_empty() {
        return Err("Empty size string".to_string());
    }

    let (num_str, multiplier) = if size.ends_with("GB") || size.ends_with('G') {
        (size.trim_end_matches(|c| c == 'G' || c == 'B'), 1024u64 * 1024 * 1024)
    } else if size.ends_with("MB") || size.ends_with('M') {
        (size.trim_end_matches(|c| c == 'M' || c == 'B'), 1024u64 * 1024)
    } else if size.ends_with("KB") || size.ends_with('K') {
        (size.trim_end_matches(|c| c == 'K' || c == 'B'), 1024u64)
    } else if size.ends_with('B') {
        (size.trim_end_matches('B'), 1u64)
    } else {
        // Assume bytes if no suffix
        (size.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number: {}", num_str))?;

    Ok((num * multiplier as f64) as u64)
}

/// Parse an unsigned integer given as `0x`-prefixed hex or decimal
pub fn parse_u64(value: &str) -> std::result::Result<u64, String> {
    let value = value.trim().replace('_', "");
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("Invalid integer '{}': {}", value, e))
}
