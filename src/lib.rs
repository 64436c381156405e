#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_precision_loss,      // Acceptable for jitter math
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions   // e.g. ClientError in client module
)]

pub mod app;
pub mod buffer;
pub mod domain;
pub mod logger;
pub mod reliability;
pub mod sender;

// Re-export the main types for easy access
pub use domain::{ErrorKind, ErrorRecord, LogEvent, Severity};
pub use logger::{ConfigError, HecLogger, LoggerConfig};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
