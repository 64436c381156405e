//! Domain layer for hec-forwarder.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEvent`: the immutable event handed to the batching engine
//! - `Severity`: HEC severity level (Error/Warning/Info/Verbose/Off)
//! - `ErrorLog`: per-logger record of failed and suppressed events

pub mod error;
pub mod event;
pub mod severity;

pub use error::{ErrorKind, ErrorLog, ErrorRecord};
pub use event::LogEvent;
pub use severity::{Severity, UnknownSeverity};
