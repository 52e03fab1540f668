//! Cache validation built on checksums
//!
//! Combines creation/modification timestamps with a checksum into a
//! classified (None/Weak/Strong) integrity token.

mod reference;
mod validator;

pub use reference::*;
pub use validator::*;
