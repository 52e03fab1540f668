//! Immutable digest bytes and their text forms

use crate::error::{ChecksumError, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Output of a checksum computation
///
/// Two digests are equal exactly when their hex strings are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(Vec<u8>);

impl Digest {
    /// Wrap raw digest bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse a hex string (either case)
    pub fn from_hex(text: &str) -> Result<Self> {
        hex::decode(text.trim())
            .map(Self)
            .map_err(|e| ChecksumError::InvalidDigest(format!("'{}': {}", text, e)))
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Number of bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the empty digest
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lowercase hexadecimal
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Standard padded base64
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    /// URL-safe base64 without padding
    pub fn to_base64_url(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    /// Every bit as `0`/`1`, most significant bit of the first byte first
    pub fn to_binary_string(&self) -> String {
        self.0.iter().map(|b| format!("{:08b}", b)).collect()
    }

    /// Big-endian integer value, for digests of at most eight bytes
    pub fn to_u64(&self) -> Option<u64> {
        if self.0.len() > 8 {
            return None;
        }
        Some(self.0.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Digest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Digest::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
