//! Longform Common Utilities
//!
//! Shared infrastructure for all Longform crates:
//! - Error types and result aliases
//! - Timecode formatting for chapter markers and progress output
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod timecode;

pub use config::*;
pub use error::*;
pub use timecode::*;
