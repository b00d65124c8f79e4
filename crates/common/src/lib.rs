//! Cutline Common Utilities
//!
//! Shared infrastructure for all Cutline crates:
//! - Error types and result aliases
//! - Drift measurement and timecode formatting
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
