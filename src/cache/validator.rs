//! Cache validators: timestamps plus a classified checksum
//!
//! A validator is fixed at construction. The derivation method decides
//! which bytes feed the checksum and how strong the result is:
//!
//! | Method    | Bytes                                        | Strength                |
//! |-----------|----------------------------------------------|-------------------------|
//! | Default   | supplied checksum (or nothing)               | Strong if non-empty, else None |
//! | Timestamp | `created ^ modified` ticks                   | always Weak             |
//! | Combined  | `created ^ modified ^ reduce(checksum)`      | Strong if non-empty, else Weak |

use crate::config::ChecksumAlgorithm;
use crate::encode::{encode_str, Scalar, TextEncoding};
use crate::error::{ChecksumError, Result};
use crate::hash::{Checksum, Digest, Fnv, FnvWidth, HashEngine};
use chrono::{DateTime, TimeZone, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ticks (100 ns units) between 0001-01-01T00:00:00Z and the Unix epoch
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Reduction used by [`ChecksumMethod::Combined`] when no checksum was
/// supplied: the FNV-1a/64 offset basis, i.e. the reduction of nothing.
pub const NO_CHECKSUM_SENTINEL: i64 = 0xCBF2_9CE4_8422_2325_u64 as i64;

/// Earliest representable timestamp, tick 0
pub fn min_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// 100-nanosecond intervals since 0001-01-01T00:00:00Z
pub fn ticks(timestamp: &DateTime<Utc>) -> Result<i64> {
    let out_of_range = || ChecksumError::TimestampOutOfRange(timestamp.to_rfc3339());
    timestamp
        .timestamp()
        .checked_mul(10_000_000)
        .and_then(|t| t.checked_add(i64::from(timestamp.timestamp_subsec_nanos() / 100)))
        .and_then(|t| t.checked_add(UNIX_EPOCH_TICKS))
        .filter(|t| *t >= 0)
        .ok_or_else(out_of_range)
}

/// How reliably a validator detects change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    /// No usable fingerprint
    #[default]
    None,
    /// Derived from timestamps only
    Weak,
    /// Derived from content
    Strong,
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Weak => "weak",
            Self::Strong => "strong",
        };
        f.write_str(name)
    }
}

/// Checksum derivation method
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMethod {
    /// Use the supplied checksum bytes as-is
    #[default]
    Default,
    /// Replace the checksum with the XOR of the timestamps
    Timestamp,
    /// XOR the timestamps with a reduction of the supplied checksum
    Combined,
}

impl ChecksumMethod {
    /// Stable numeric code
    pub fn code(&self) -> i32 {
        match self {
            Self::Default => 0,
            Self::Timestamp => 1,
            Self::Combined => 2,
        }
    }
}

impl TryFrom<i32> for ChecksumMethod {
    type Error = ChecksumError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Default),
            1 => Ok(Self::Timestamp),
            2 => Ok(Self::Combined),
            other => Err(ChecksumError::UnsupportedMethod(format!("code {}", other))),
        }
    }
}

impl FromStr for ChecksumMethod {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "timestamp" => Ok(Self::Timestamp),
            "combined" => Ok(Self::Combined),
            _ => Err(ChecksumError::UnsupportedMethod(s.to_string())),
        }
    }
}

/// Raw checksum source handed to a validator
#[derive(Debug, Clone, PartialEq)]
pub enum ChecksumSeed {
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Scalar, encoded in the engine's byte order
    Scalar(Scalar),
    /// Text, encoded as UTF-8 without a byte-order mark
    Text(String),
}

impl ChecksumSeed {
    fn into_bytes(self, algorithm: ChecksumAlgorithm) -> Vec<u8> {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Scalar(value) => value.encode(algorithm.engine().byte_order()),
            Self::Text(text) => encode_str(&text, TextEncoding::Utf8, false),
        }
    }
}

impl From<Vec<u8>> for ChecksumSeed {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ChecksumSeed {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<&str> for ChecksumSeed {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ChecksumSeed {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Scalar> for ChecksumSeed {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

/// Settings for building a validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Derivation method
    pub method: ChecksumMethod,
    /// Algorithm of the underlying checksum
    pub algorithm: ChecksumAlgorithm,
}

/// Creation/modification timestamps combined with a classified checksum
#[derive(Debug, Clone)]
pub struct CacheValidator {
    created: DateTime<Utc>,
    modified: Option<DateTime<Utc>>,
    strength: Strength,
    method: ChecksumMethod,
    checksum: Checksum,
}

impl CacheValidator {
    /// Build a validator with the default checksum algorithm
    pub fn new<Tz: TimeZone>(
        created: DateTime<Tz>,
        modified: Option<DateTime<Tz>>,
        seed: Option<ChecksumSeed>,
        method: ChecksumMethod,
    ) -> Result<Self> {
        Self::with_config(
            created,
            modified,
            seed,
            ValidatorConfig {
                method,
                ..Default::default()
            },
        )
    }

    /// Build a validator. Timestamps are normalized to UTC first.
    pub fn with_config<Tz: TimeZone>(
        created: DateTime<Tz>,
        modified: Option<DateTime<Tz>>,
        seed: Option<ChecksumSeed>,
        config: ValidatorConfig,
    ) -> Result<Self> {
        let created = created.with_timezone(&Utc);
        let modified = modified.map(|m| m.with_timezone(&Utc));
        let algorithm = config.algorithm;
        let supplied = seed
            .map(|s| s.into_bytes(algorithm))
            .filter(|bytes| !bytes.is_empty());

        let (bytes, strength) = match config.method {
            ChecksumMethod::Default => match supplied {
                Some(bytes) => (bytes, Strength::Strong),
                None => (Vec::new(), Strength::None),
            },
            ChecksumMethod::Timestamp => {
                let value = timestamp_xor(&created, modified.as_ref())?;
                (encode_ticks(value, algorithm), Strength::Weak)
            }
            ChecksumMethod::Combined => {
                let (reduced, strength) = match &supplied {
                    Some(bytes) => (reduce(bytes), Strength::Strong),
                    None => (NO_CHECKSUM_SENTINEL, Strength::Weak),
                };
                let value = timestamp_xor(&created, modified.as_ref())? ^ reduced;
                (encode_ticks(value, algorithm), strength)
            }
        };

        Ok(Self {
            created,
            modified,
            strength,
            method: config.method,
            checksum: Checksum::from_bytes(bytes, algorithm),
        })
    }

    /// Canonical invalid validator: minimum timestamp, no checksum
    pub fn invalid() -> Self {
        Self {
            created: min_timestamp(),
            modified: None,
            strength: Strength::None,
            method: ChecksumMethod::Default,
            checksum: Checksum::default(),
        }
    }

    /// Creation time (UTC)
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Modification time (UTC), if any
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Strength classification
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// Method used to derive the checksum
    pub fn method(&self) -> ChecksumMethod {
        self.method
    }

    /// Underlying checksum
    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    /// Digest of the underlying checksum
    pub fn digest(&self) -> &Digest {
        self.checksum.digest()
    }

    /// Later of created and modified; a missing modified counts as the minimum
    pub fn most_significant(&self) -> DateTime<Utc> {
        match self.modified {
            Some(modified) if modified > self.created => modified,
            _ => self.created,
        }
    }

    /// Entry whose most significant timestamp is latest; ties keep the
    /// earlier entry.
    ///
    /// Entries equal to the invalid validator are skipped. Returns the
    /// invalid validator when nothing else remains.
    pub fn most_significant_of<'a, I>(validators: I) -> CacheValidator
    where
        I: IntoIterator<Item = &'a CacheValidator>,
    {
        let invalid = Self::invalid();
        let mut best: Option<&CacheValidator> = None;
        for candidate in validators {
            if *candidate == invalid {
                continue;
            }
            match best {
                Some(current) if candidate.most_significant() <= current.most_significant() => {}
                _ => best = Some(candidate),
            }
        }
        best.cloned().unwrap_or(invalid)
    }

    /// Whether this differs from the canonical invalid validator
    pub fn is_valid(&self) -> bool {
        *self != Self::invalid()
    }

    /// Extend the checksum bytes; the cached digest is dropped
    pub fn append_checksum(&mut self, other: &Checksum) {
        self.checksum.append_checksum(other);
    }

    /// New validator with `other`'s bytes appended after this one's.
    ///
    /// The later most-significant timestamp becomes `modified` and the
    /// strength is the weaker of the two.
    pub fn combine_with(&self, other: &CacheValidator) -> CacheValidator {
        let mut combined = self.clone();
        combined.append_checksum(&other.checksum);
        let latest = self.most_significant().max(other.most_significant());
        if latest > combined.created {
            combined.modified = Some(latest);
        }
        combined.strength = self.strength.min(other.strength);
        combined
    }

    /// Serializable summary
    pub fn report(&self) -> ValidatorReport {
        ValidatorReport {
            created: self.created,
            modified: self.modified,
            most_significant: self.most_significant(),
            strength: self.strength,
            method: self.method,
            algorithm: self.checksum.algorithm(),
            digest: self.digest().clone(),
        }
    }
}

impl Default for CacheValidator {
    fn default() -> Self {
        Self::invalid()
    }
}

impl PartialEq for CacheValidator {
    fn eq(&self, other: &Self) -> bool {
        self.created == other.created
            && self.modified == other.modified
            && self.strength == other.strength
            && self.checksum == other.checksum
    }
}

impl Eq for CacheValidator {}

/// Printable validator summary
#[derive(Debug, Clone, Serialize)]
pub struct ValidatorReport {
    /// Creation time
    pub created: DateTime<Utc>,
    /// Modification time
    pub modified: Option<DateTime<Utc>>,
    /// Later of the two
    pub most_significant: DateTime<Utc>,
    /// Strength classification
    pub strength: Strength,
    /// Derivation method
    pub method: ChecksumMethod,
    /// Checksum algorithm
    pub algorithm: Option<ChecksumAlgorithm>,
    /// Checksum digest
    pub digest: Digest,
}

fn timestamp_xor(created: &DateTime<Utc>, modified: Option<&DateTime<Utc>>) -> Result<i64> {
    let modified_ticks = match modified {
        Some(m) => ticks(m)?,
        None => 0,
    };
    Ok(ticks(created)? ^ modified_ticks)
}

fn encode_ticks(value: i64, algorithm: ChecksumAlgorithm) -> Vec<u8> {
    Scalar::I64(value).encode(algorithm.engine().byte_order())
}

/// Fold checksum bytes to one 64-bit value with FNV-1a
fn reduce(bytes: &[u8]) -> i64 {
    let digest = Fnv::new(FnvWidth::W64).compute(bytes);
    digest.to_u64().unwrap_or_default() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::ByteOrder;
    use chrono::FixedOffset;

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    fn validator(
        created: DateTime<Utc>,
        modified: Option<DateTime<Utc>>,
        seed: Option<ChecksumSeed>,
        method: ChecksumMethod,
    ) -> CacheValidator {
        CacheValidator::new(created, modified, seed, method).unwrap()
    }

    #[test]
    fn test_ticks() {
        assert_eq!(ticks(&min_timestamp()).unwrap(), 0);
        assert_eq!(ticks(&utc(1970, 1, 1)).unwrap(), UNIX_EPOCH_TICKS);
        assert_eq!(ticks(&utc(2020, 1, 1)).unwrap(), 637_134_336_000_000_000);
        let later = utc(2020, 1, 1) + chrono::Duration::nanoseconds(1_250);
        assert_eq!(ticks(&later).unwrap(), 637_134_336_000_000_012);
    }

    #[test]
    fn test_ticks_out_of_range() {
        let far = Utc.with_ymd_and_hms(40_000, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(ticks(&far), Err(ChecksumError::TimestampOutOfRange(_))));
        let before = Utc.with_ymd_and_hms(-5, 1, 1, 0, 0, 0).unwrap();
        assert!(ticks(&before).is_err());
    }

    #[test]
    fn test_default_without_checksum_is_none() {
        let v = validator(utc(2020, 1, 1), None, None, ChecksumMethod::Default);
        assert_eq!(v.strength(), Strength::None);
        assert!(v.checksum().is_empty());
        assert_eq!(v.digest(), Checksum::default().digest());
    }

    #[test]
    fn test_default_with_checksum_is_strong() {
        let v = validator(
            utc(2020, 1, 1),
            None,
            Some(b"content".as_slice().into()),
            ChecksumMethod::Default,
        );
        assert_eq!(v.strength(), Strength::Strong);
        assert_eq!(v.checksum().bytes(), b"content");

        let empty = validator(utc(2020, 1, 1), None, Some(Vec::<u8>::new().into()), ChecksumMethod::Default);
        assert_eq!(empty.strength(), Strength::None);
    }

    #[test]
    fn test_timestamp_is_always_weak() {
        let created = utc(2020, 1, 1);
        let modified = utc(2021, 6, 1);
        for seed in [None, Some(ChecksumSeed::from("abc"))] {
            let v = validator(created, Some(modified), seed, ChecksumMethod::Timestamp);
            assert_eq!(v.strength(), Strength::Weak);
            let expected = ticks(&created).unwrap() ^ ticks(&modified).unwrap();
            assert_eq!(v.checksum().bytes(), expected.to_be_bytes());
        }
    }

    #[test]
    fn test_timestamp_without_modified_uses_min_ticks() {
        let created = utc(2020, 1, 1);
        let v = validator(created, None, None, ChecksumMethod::Timestamp);
        assert_eq!(v.checksum().bytes(), ticks(&created).unwrap().to_be_bytes());
    }

    #[test]
    fn test_combined_strength_and_bytes() {
        let created = utc(2020, 1, 1);
        let with = validator(created, None, Some("abc".into()), ChecksumMethod::Combined);
        assert_eq!(with.strength(), Strength::Strong);
        let expected = ticks(&created).unwrap() ^ reduce(b"abc");
        assert_eq!(with.checksum().bytes(), expected.to_be_bytes());

        let without = validator(created, None, None, ChecksumMethod::Combined);
        assert_eq!(without.strength(), Strength::Weak);
        let expected = ticks(&created).unwrap() ^ NO_CHECKSUM_SENTINEL;
        assert_eq!(without.checksum().bytes(), expected.to_be_bytes());
        assert_ne!(with, without);
    }

    #[test]
    fn test_sentinel_is_reduction_of_nothing() {
        assert_eq!(reduce(&[]), NO_CHECKSUM_SENTINEL);
    }

    #[test]
    fn test_timestamps_normalized_to_utc() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2020, 1, 1, 2, 0, 0).unwrap();
        let v = CacheValidator::new(local, None, None, ChecksumMethod::Timestamp).unwrap();
        assert_eq!(v.created(), utc(2020, 1, 1));
        assert_eq!(v, validator(utc(2020, 1, 1), None, None, ChecksumMethod::Timestamp));
    }

    #[test]
    fn test_scalar_seed_follows_engine_order() {
        let config = ValidatorConfig {
            method: ChecksumMethod::Default,
            algorithm: ChecksumAlgorithm::Crc32,
        };
        let v = CacheValidator::with_config(
            utc(2020, 1, 1),
            None,
            Some(Scalar::U32(0xAABB_CCDD).into()),
            config,
        )
        .unwrap();
        assert_eq!(
            v.checksum().bytes(),
            Scalar::U32(0xAABB_CCDD).encode(ByteOrder::BigEndian)
        );
        assert_eq!(v.checksum().algorithm(), Some(ChecksumAlgorithm::Crc32));
    }

    #[test]
    fn test_most_significant() {
        let created = utc(2020, 1, 1);
        let v = validator(created, None, None, ChecksumMethod::Default);
        assert_eq!(v.most_significant(), created);

        let v = validator(created, Some(utc(2022, 1, 1)), None, ChecksumMethod::Default);
        assert_eq!(v.most_significant(), utc(2022, 1, 1));

        let v = validator(created, Some(utc(2019, 1, 1)), None, ChecksumMethod::Default);
        assert_eq!(v.most_significant(), created);
    }

    #[test]
    fn test_most_significant_of_sequence() {
        let a = validator(utc(2019, 1, 1), None, Some("a".into()), ChecksumMethod::Default);
        let b = validator(utc(2021, 1, 1), None, Some("b".into()), ChecksumMethod::Default);
        assert_eq!(CacheValidator::most_significant_of([&a, &b]), b);
        assert_eq!(CacheValidator::most_significant_of(vec![&b, &a]), b);

        let empty: Vec<&CacheValidator> = Vec::new();
        let fallback = CacheValidator::most_significant_of(empty);
        assert_eq!(fallback, CacheValidator::invalid());
        assert!(!fallback.is_valid());

        let defaults = [CacheValidator::invalid(), CacheValidator::default()];
        assert!(!CacheValidator::most_significant_of(&defaults).is_valid());
    }

    #[test]
    fn test_most_significant_of_keeps_minimum_timestamp_entries() {
        let strong = validator(min_timestamp(), None, Some("content".into()), ChecksumMethod::Default);
        assert!(strong.is_valid());
        assert_eq!(strong.most_significant(), min_timestamp());

        let picked = CacheValidator::most_significant_of([&strong]);
        assert_eq!(picked, strong);
        assert_eq!(picked.strength(), Strength::Strong);

        let invalid = CacheValidator::invalid();
        assert_eq!(CacheValidator::most_significant_of([&invalid, &strong]), strong);

        let first = validator(utc(2020, 1, 1), None, Some("first".into()), ChecksumMethod::Default);
        let second = validator(utc(2020, 1, 1), None, Some("second".into()), ChecksumMethod::Default);
        assert_eq!(CacheValidator::most_significant_of([&first, &second]), first);
    }

    #[test]
    fn test_clone_is_deep() {
        let original = validator(utc(2020, 1, 1), None, Some("abc".into()), ChecksumMethod::Default);
        original.digest();
        let mut copy = original.clone();
        assert_eq!(copy, original);
        assert_eq!(copy.method(), original.method());

        copy.append_checksum(&Checksum::from_bytes(b"d".to_vec(), ChecksumAlgorithm::Crc64Xz));
        assert_ne!(copy, original);
        assert_eq!(original.checksum().bytes(), b"abc");
        assert_eq!(copy.checksum().bytes(), b"abcd");
    }

    #[test]
    fn test_combine_with() {
        let a = validator(utc(2020, 1, 1), None, Some("a".into()), ChecksumMethod::Default);
        let b = validator(utc(2021, 1, 1), None, None, ChecksumMethod::Timestamp);
        let combined = a.combine_with(&b);
        assert_eq!(combined.strength(), Strength::Weak);
        assert_eq!(combined.most_significant(), utc(2021, 1, 1));
        assert_eq!(combined.checksum().len(), 1 + 8);
        assert_ne!(a.combine_with(&b).digest(), b.combine_with(&a).digest());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("Combined".parse::<ChecksumMethod>().unwrap(), ChecksumMethod::Combined);
        assert_eq!(ChecksumMethod::try_from(1).unwrap(), ChecksumMethod::Timestamp);
        for method in [ChecksumMethod::Default, ChecksumMethod::Timestamp, ChecksumMethod::Combined] {
            assert_eq!(ChecksumMethod::try_from(method.code()).unwrap(), method);
        }
        let err = ChecksumMethod::try_from(7).unwrap_err();
        assert!(err.is_configuration_error());
        assert!("sha".parse::<ChecksumMethod>().is_err());
    }

    #[test]
    fn test_strength_order() {
        assert!(Strength::None < Strength::Weak);
        assert!(Strength::Weak < Strength::Strong);
        assert_eq!(Strength::Strong.to_string(), "strong");
    }

    #[test]
    fn test_report_serializes() {
        let v = validator(utc(2020, 1, 1), None, None, ChecksumMethod::Default);
        let json = serde_json::to_value(v.report()).unwrap();
        assert_eq!(json["strength"], "none");
        assert_eq!(json["method"], "default");
        assert_eq!(json["algorithm"], "crc64-xz");
        assert_eq!(json["digest"], "0000000000000000");
    }
}
