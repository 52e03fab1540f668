//! Error types for SmartSum
//!
//! Configuration errors (bad CRC width, unknown derivation method) fail fast
//! at construction. Digest computation itself never fails.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for checksum and cache-validator operations
#[derive(Error, Debug)]
pub enum ChecksumError {
    /// CRC register width is zero, above 64 or not a whole number of bytes
    #[error("Invalid CRC width: {width} bits (must be a multiple of 8 between 8 and 64)")]
    InvalidWidth {
        /// Requested width in bits
        width: u32,
    },

    /// A CRC parameter does not fit in the register width
    #[error("CRC parameter '{parameter}' = {value:#x} does not fit in {width} bits")]
    ParameterOutOfRange {
        /// Parameter name
        parameter: &'static str,
        /// Supplied value
        value: u64,
        /// Register width in bits
        width: u32,
    },

    /// Checksum derivation method outside the defined set
    #[error("Unsupported checksum method: {0}")]
    UnsupportedMethod(String),

    /// Algorithm selector not recognised
    #[error("Unsupported checksum algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Digest text could not be decoded
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),

    /// Timestamp cannot be expressed in ticks
    #[error("Timestamp out of range: {0}")]
    TimestampOutOfRange(String),

    /// I/O error while reading a reference file
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        /// What was being done
        context: String,
        /// Wrapped error
        #[source]
        source: Box<ChecksumError>,
    },
}

impl ChecksumError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error was raised while validating configuration
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::InvalidWidth { .. }
            | Self::ParameterOutOfRange { .. }
            | Self::UnsupportedMethod(_)
            | Self::UnsupportedAlgorithm(_)
            | Self::ConfigError(_) => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::WithContext { source, .. } => source.path(),
            _ => None,
        }
    }
}

/// Result type alias for SmartSum operations
pub type Result<T> = std::result::Result<T, ChecksumError>;

impl From<std::io::Error> for ChecksumError {
    fn from(err: std::io::Error) -> Self {
        ChecksumError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ChecksumError {
    fn from(err: serde_json::Error) -> Self {
        ChecksumError::ConfigError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| ChecksumError::io(path, e))
    }
}
