//! # Blackhawk Utilities
//!
//! Shared helpers for programs built on `blackhawk-core`.
//!
//! Currently this is the logging setup: a `tracing` subscriber configured from
//! the environment, with optional file output.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogLevel, LogSettings, LoggingError,
    LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
