//! Cache validators derived from files
//!
//! A reference file contributes its creation and modification times and,
//! when asked, up to `max_bytes` of its content. Without content (nothing
//! requested, or an empty file) the file name stands in as an identity and
//! the validator stays weak.

use crate::cache::{CacheValidator, ChecksumMethod, ChecksumSeed, ValidatorConfig};
use crate::config::ChecksumAlgorithm;
use crate::encode::{encode_str, TextEncoding};
use crate::error::{IoResultExt, Result};
use crate::hash::Checksum;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// How to derive a validator from a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceOptions {
    /// Bytes of content to read; 0 hashes the file name only
    pub max_bytes: u64,
    /// Derivation method used when content is read
    pub method: ChecksumMethod,
    /// Checksum algorithm
    pub algorithm: ChecksumAlgorithm,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024, // 1MB
            method: ChecksumMethod::Default,
            algorithm: ChecksumAlgorithm::default(),
        }
    }
}

impl CacheValidator {
    /// Derive a validator from a file's metadata and content
    pub fn from_file(path: &Path, options: &ReferenceOptions) -> Result<Self> {
        let metadata = std::fs::metadata(path).with_path(path)?;
        let modified: DateTime<Utc> = metadata.modified().with_path(path)?.into();
        // not every filesystem records a birth time
        let created: DateTime<Utc> = metadata.created().map(Into::into).unwrap_or(modified);

        let mut content = Vec::new();
        if options.max_bytes > 0 {
            File::open(path)
                .with_path(path)?
                .take(options.max_bytes)
                .read_to_end(&mut content)
                .with_path(path)?;
        }

        if !content.is_empty() {
            tracing::debug!(
                "Reference {:?}: {} content bytes, method {:?}",
                path,
                content.len(),
                options.method
            );

            return CacheValidator::with_config(
                created,
                Some(modified),
                Some(ChecksumSeed::Bytes(content)),
                ValidatorConfig {
                    method: options.method,
                    algorithm: options.algorithm,
                },
            );
        }

        let identity = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        tracing::debug!("Reference {:?}: identity only ({})", path, identity);

        let mut validator = CacheValidator::with_config(
            created,
            Some(modified),
            None,
            ValidatorConfig {
                method: ChecksumMethod::Timestamp,
                algorithm: options.algorithm,
            },
        )?;
        validator.append_checksum(&Checksum::from_bytes(
            encode_str(&identity, TextEncoding::Utf8, false),
            options.algorithm,
        ));
        Ok(validator)
    }
}

/// Once-initialized shared validator slot
///
/// The first caller of [`ReferenceCell::get_or_init`] builds the value;
/// concurrent first callers wait and all observe that same value.
/// [`ReferenceCell::reset`] empties the slot again.
#[derive(Debug, Default)]
pub struct ReferenceCell {
    slot: RwLock<Option<Arc<CacheValidator>>>,
}

impl ReferenceCell {
    /// Empty cell
    pub const fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Current value, if initialized
    pub fn get(&self) -> Option<Arc<CacheValidator>> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Return the value, building it with `init` on first access
    pub fn get_or_init<F>(&self, init: F) -> Arc<CacheValidator>
    where
        F: FnOnce() -> CacheValidator,
    {
        if let Some(value) = self.get() {
            return value;
        }

        let mut guard = match self.slot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // another thread may have won the race for the write lock
        if let Some(value) = guard.as_ref() {
            return Arc::clone(value);
        }
        let value = Arc::new(init());
        *guard = Some(Arc::clone(&value));
        value
    }

    /// Drop the stored value
    pub fn reset(&self) {
        match self.slot.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }
}

static PROCESS_DEFAULT: ReferenceCell = ReferenceCell::new();

/// Validator for the running executable, derived once per process.
///
/// Falls back to [`CacheValidator::invalid`] when the executable cannot be
/// inspected.
pub fn process_default() -> Arc<CacheValidator> {
    PROCESS_DEFAULT.get_or_init(|| {
        let options = ReferenceOptions {
            max_bytes: 0,
            ..Default::default()
        };
        let derived = std::env::current_exe()
            .map_err(Into::into)
            .and_then(|exe| CacheValidator::from_file(&exe, &options));
        match derived {
            Ok(validator) => validator,
            Err(e) => {
                tracing::warn!("Cannot derive reference validator: {}", e);
                CacheValidator::invalid()
            }
        }
    })
}

/// Forget the process default so the next call derives it again
pub fn reset_process_default() {
    PROCESS_DEFAULT.reset();
}
