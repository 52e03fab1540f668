//! Byte encoding of primitive values and strings
//!
//! Produces the ordered byte sequences every checksum in this crate is
//! computed over.

mod scalar;
mod text;

pub use scalar::*;
pub use text::*;
