//! Logging infrastructure for abc2piano.
//!
//! This module provides:
//! - Per-request loggers with file + callback dual output
//! - Compact mode that keeps tool output out of the log until it matters
//! - Tail buffer for error diagnosis
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use abc2piano_core::logging::{LogConfig, RequestLogger};
//! use abc2piano_core::models::RequestId;
//!
//! let request = RequestId::new();
//! let logger = RequestLogger::new(&request, "/path/to/logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("notation");
//! logger.command("abc2midi tune.abc -o score.mid");
//! logger.success("notation completed");
//! ```

mod request_logger;
mod types;

pub use request_logger::RequestLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to `default_level`. Output goes to
/// stderr. Calling it a second time is a no-op.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
