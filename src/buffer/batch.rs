use crate::domain::LogEvent;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// What triggered a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchType {
    /// The queue reached the configured size threshold.
    SizeBased,
    /// The flush interval elapsed with events pending.
    TimeBased,
    /// An explicit `flush` call.
    Forced,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Queue length that triggers an immediate flush.
    pub max_size: usize,
    /// Longest time events wait in the queue before a timed flush.
    pub max_wait: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            max_wait: Duration::from_millis(500),
        }
    }
}

/// An ordered group of events flushed to the collector as one request.
#[derive(Debug, Clone)]
pub struct Batch {
    id: String,
    events: Vec<LogEvent>,
    batch_type: BatchType,
    created_at: Instant,
}

impl Batch {
    pub fn new(events: Vec<LogEvent>, batch_type: BatchType) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            events,
            batch_type,
            created_at: Instant::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }

    pub fn batch_type(&self) -> BatchType {
        self.batch_type
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}
