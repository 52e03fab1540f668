//! Checksum engines and integrity helpers
//!
//! Table-driven CRC, FNV-1a up to 1024 bits, the incremental
//! [`Checksum`] accumulator, and streaming file hashing.

mod checksum;
mod crc;
mod digest;
mod engine;
mod fnv;
mod integrity;
pub mod wide;

pub use checksum::*;
pub use crc::*;
pub use digest::*;
pub use engine::*;
pub use fnv::*;
pub use integrity::*;
