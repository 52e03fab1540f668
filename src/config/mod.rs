//! Configuration module for SmartSum
//!
//! Provides the algorithm selector, CLI arguments, and size parsing.

mod settings;

pub use settings::*;
