mod config;
mod serde_helpers;

pub use config::{ConfigError, LoggerConfig};

use crate::buffer::{BatchConfig, EventBatcher};
use crate::domain::{ErrorKind, ErrorLog, ErrorRecord, LogEvent, Severity};
use crate::reliability::{resend_events, ResendPolicy, ResendReport};
use crate::sender::{ClientConfig, EnvelopeSerializer, HecClient, Sender};
use parking_lot::RwLock;
use tracing::warn;

const SUPPRESSED_REASON: &str = "cannot send events while the logger level is OFF";

/// Facade that forwards application log events to a Splunk HTTP Event
/// Collector.
///
/// Send failures never surface through [`log`](Self::log); they accumulate in
/// an error log the caller can inspect, clear, or resend. Construct inside a
/// tokio runtime when batching is enabled, since batching spawns a background
/// flush task.
pub struct HecLogger<S: Sender = HecClient> {
    state: RwLock<MutableState>,
    batcher: EventBatcher<S>,
    errors: ErrorLog,
    serializer: EnvelopeSerializer,
    resend_policy: ResendPolicy,
}

struct MutableState {
    level: Severity,
    sourcetype: String,
    tls: bool,
}

impl HecLogger<HecClient> {
    /// Builds a logger backed by a real HTTP client.
    pub fn new(config: LoggerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = HecClient::new(ClientConfig {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            tls: config.tls,
            ..ClientConfig::default()
        })
        .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        Ok(Self::with_sender(config, client))
    }
}

impl<S: Sender> HecLogger<S> {
    /// Builds a logger around an arbitrary sender; the seam used by tests.
    pub fn with_sender(config: LoggerConfig, sender: S) -> Self {
        let errors = ErrorLog::new();
        let batcher = EventBatcher::new(
            BatchConfig {
                max_size: config.batch_size,
                max_wait: config.batch_interval,
            },
            sender,
            errors.clone(),
        );

        let logger = Self {
            state: RwLock::new(MutableState {
                level: config.level,
                sourcetype: config.sourcetype,
                tls: config.tls,
            }),
            batcher,
            errors,
            serializer: EnvelopeSerializer::new(),
            resend_policy: ResendPolicy::default(),
        };

        if config.batching {
            logger.batcher.start();
        }
        logger
    }

    pub fn resend_policy(mut self, policy: ResendPolicy) -> Self {
        self.resend_policy = policy;
        self
    }

    /// Forwards one message, stamped with the current level and sourcetype.
    /// Never fails; problems are recorded in the error log instead.
    pub async fn log(&self, message: impl Into<String>) {
        let (level, sourcetype) = {
            let state = self.state.read();
            (state.level, state.sourcetype.clone())
        };

        let event = LogEvent::new(message, level, sourcetype);
        if level == Severity::Off {
            self.errors
                .record(ErrorKind::Suppressed, SUPPRESSED_REASON, event);
            return;
        }

        self.batcher.enqueue(event).await;
    }

    /// Case-insensitive; unknown levels leave the current level unchanged.
    pub fn set_level(&self, level: &str) {
        match level.parse::<Severity>() {
            Ok(parsed) => self.state.write().level = parsed,
            Err(e) => warn!(level, error = %e, "ignoring unknown severity level"),
        }
    }

    pub fn level(&self) -> Severity {
        self.state.read().level
    }

    pub fn set_sourcetype(&self, sourcetype: impl Into<String>) {
        self.state.write().sourcetype = sourcetype.into();
    }

    pub fn sourcetype(&self) -> String {
        self.state.read().sourcetype.clone()
    }

    /// Marks the endpoint as TLS. Transport behavior is unchanged; certificate
    /// policy is out of scope here.
    pub fn enable_tls(&self) {
        self.state.write().tls = true;
    }

    pub fn tls_enabled(&self) -> bool {
        self.state.read().tls
    }

    /// Starts queuing events and flushing them in batches.
    pub fn enable_batching(&self) {
        self.batcher.start();
    }

    /// Stops the background flush task. Pending events stay queued and are
    /// not flushed on stop; call [`flush`](Self::flush) first to push them out.
    pub async fn disable_batching(&self) {
        self.batcher.stop().await;
    }

    pub fn batching_enabled(&self) -> bool {
        self.batcher.is_enabled()
    }

    /// Forces out whatever is queued right now.
    pub async fn flush(&self) {
        self.batcher.flush().await;
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.errors.snapshot()
    }

    pub fn clear_errors(&self) {
        self.errors.clear();
    }

    /// Retries every event in the error log, bounded per event by the resend
    /// policy. Works over a stable snapshot: events that keep failing are
    /// recorded again exactly once, and suppressed events stay suppressed
    /// while the level is `Off`.
    pub async fn resend_errors(&self) -> ResendReport {
        let records = self.errors.take();
        let (level, sourcetype) = {
            let state = self.state.read();
            (state.level, state.sourcetype.clone())
        };

        let mut to_send = Vec::with_capacity(records.len());
        let mut suppressed = 0;
        for record in records {
            if level == Severity::Off {
                suppressed += 1;
                self.errors
                    .record(ErrorKind::Suppressed, SUPPRESSED_REASON, record.event);
                continue;
            }
            // Re-stamp with the current level and sourcetype, as a fresh log
            // call would.
            to_send.push(LogEvent::new(
                record.event.message().to_string(),
                level,
                sourcetype.clone(),
            ));
        }

        let mut report = resend_events(
            self.batcher.sender(),
            &self.serializer,
            &self.resend_policy,
            to_send,
            &self.errors,
        )
        .await;
        report.suppressed = suppressed;
        report
    }
}
