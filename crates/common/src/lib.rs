//! Leaven Common Utilities
//!
//! Shared infrastructure for all Leaven crates:
//! - Error types and result aliases
//! - Still filename timestamps and elapsed-time formatting
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
