use super::LogEvent;
use parking_lot::Mutex;
use std::sync::Arc;

/// Why an event ended up in the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A send attempt failed at the network or HTTP layer.
    TransportFailure,
    /// The event was logged while the logger level was `Off`.
    Suppressed,
}

/// A failed or suppressed event paired with its failure description.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub reason: String,
    pub event: LogEvent,
}

/// In-memory log of events that could not be forwarded.
///
/// Clone-shared between the logger facade and the batching engine. All access
/// goes through these methods; callers never touch the list directly.
#[derive(Clone, Default)]
pub struct ErrorLog {
    inner: Arc<Mutex<Vec<ErrorRecord>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, kind: ErrorKind, reason: impl Into<String>, event: LogEvent) {
        self.inner.lock().push(ErrorRecord {
            kind,
            reason: reason.into(),
            event,
        });
    }

    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.inner.lock().clone()
    }

    /// Drains the log, returning a stable snapshot. Used by resend so a
    /// failing resend appends to a fresh list instead of the one being
    /// iterated.
    pub fn take(&self) -> Vec<ErrorRecord> {
        std::mem::take(&mut *self.inner.lock())
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
