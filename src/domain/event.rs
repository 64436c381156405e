use super::Severity;
use serde::{Deserialize, Serialize};

/// A single application log event, immutable once created.
///
/// Severity and sourcetype are stamped from the logger configuration at the
/// time the event is logged; later configuration changes only affect
/// subsequent events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    message: String,
    severity: Severity,
    sourcetype: String,
}

impl LogEvent {
    pub fn new(
        message: impl Into<String>,
        severity: Severity,
        sourcetype: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            severity,
            sourcetype: sourcetype.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn sourcetype(&self) -> &str {
        &self.sourcetype
    }
}
