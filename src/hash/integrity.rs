//! File integrity checks with the checksum engines
//!
//! Files are streamed through an engine's [`StreamHasher`](crate::hash::StreamHasher)
//! so arbitrarily large inputs hash in constant memory.

use crate::config::ChecksumAlgorithm;
use crate::encode::ByteOrder;
use crate::error::{IoResultExt, Result};
use crate::hash::{Digest, HashEngine};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Checksum of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    /// Hashed file
    pub path: PathBuf,
    /// Algorithm used
    pub algorithm: ChecksumAlgorithm,
    /// Resulting digest
    pub digest: Digest,
    /// File size in bytes
    pub size: u64,
}

impl FileChecksum {
    /// Same algorithm and digest
    pub fn matches(&self, other: &FileChecksum) -> bool {
        self.algorithm == other.algorithm && self.digest == other.digest
    }
}

impl std::fmt::Display for FileChecksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}  {}", self.digest, self.path.display())
    }
}

/// Checksum a file
pub fn hash_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<FileChecksum> {
    hash_file_with_buffer(path, algorithm, 1024 * 1024) // 1MB buffer
}

/// Checksum a file reading `buffer_size` bytes at a time
pub fn hash_file_with_buffer(
    path: &Path,
    algorithm: ChecksumAlgorithm,
    buffer_size: usize,
) -> Result<FileChecksum> {
    let (digest, size) = digest_file(path, algorithm.engine(), buffer_size)?;
    tracing::debug!("{:?}: {} bytes, {} = {}", path, size, algorithm.id(), digest);

    Ok(FileChecksum {
        path: path.to_path_buf(),
        algorithm,
        digest,
        size,
    })
}

/// Stream a file through any engine, returning the digest and file size
pub fn digest_file(
    path: &Path,
    engine: &dyn HashEngine,
    buffer_size: usize,
) -> Result<(Digest, u64)> {
    let file = File::open(path).with_path(path)?;
    let size = file.metadata().with_path(path)?.len();
    let buffer_size = buffer_size.max(1);
    let mut reader = BufReader::with_capacity(buffer_size, file);
    let mut hasher = engine.hasher();
    let mut buffer = vec![0u8; buffer_size];

    loop {
        let bytes_read = reader.read(&mut buffer).with_path(path)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok((hasher.finalize(), size))
}

/// Checksum in-memory data
pub fn hash_bytes(data: &[u8], algorithm: ChecksumAlgorithm) -> Digest {
    algorithm.engine().compute(data)
}

/// Checksum many files on the rayon pool; results keep input order
pub fn hash_files_parallel(
    paths: &[PathBuf],
    algorithm: ChecksumAlgorithm,
) -> Vec<Result<FileChecksum>> {
    paths
        .par_iter()
        .map(|path| hash_file(path, algorithm))
        .collect()
}

/// Like [`hash_files_parallel`], with digests written in `byte_order`
pub fn hash_files_parallel_with_order(
    paths: &[PathBuf],
    algorithm: ChecksumAlgorithm,
    byte_order: ByteOrder,
) -> Vec<Result<FileChecksum>> {
    let engine = algorithm.engine_with_order(byte_order);
    paths
        .par_iter()
        .map(|path| -> Result<FileChecksum> {
            let (digest, size) = digest_file(path, engine.as_ref(), 1024 * 1024)?;
            Ok(FileChecksum {
                path: path.clone(),
                algorithm,
                digest,
                size,
            })
        })
        .collect()
}

/// Result of comparing two files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Checksum of the first file
    pub source: FileChecksum,
    /// Checksum of the second file
    pub destination: FileChecksum,
    /// Whether the digests match
    pub matches: bool,
}

/// Check two files have identical checksums
pub fn verify_files_match(
    source: &Path,
    destination: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<VerificationResult> {
    let (source, destination) = rayon::join(
        || hash_file(source, algorithm),
        || hash_file(destination, algorithm),
    );
    let source = source?;
    let destination = destination?;
    let matches = source.matches(&destination);

    Ok(VerificationResult {
        source,
        destination,
        matches,
    })
}

/// Time every algorithm over `data_size` bytes.
///
/// Returns (algorithm, mean duration, MiB/s), fastest first.
pub fn benchmark_algorithms(data_size: usize) -> Vec<(ChecksumAlgorithm, Duration, f64)> {
    let data: Vec<u8> = (0..data_size).map(|i| (i % 256) as u8).collect();
    let mut results = Vec::with_capacity(ChecksumAlgorithm::ALL.len());

    for algorithm in ChecksumAlgorithm::ALL {
        let iterations = 10;
        let start = Instant::now();

        for _ in 0..iterations {
            hash_bytes(&data, algorithm);
        }

        let duration = start.elapsed() / iterations;
        let seconds = duration.as_secs_f64();
        let throughput = if seconds > 0.0 {
            (data_size as f64) / seconds / (1024.0 * 1024.0)
        } else {
            f64::INFINITY
        };

        results.push((algorithm, duration, throughput));
    }

    results.sort_by(|a, b| a.1.cmp(&b.1));
    results
}
