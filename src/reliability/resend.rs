use crate::domain::{ErrorKind, ErrorLog, LogEvent};
use crate::sender::{EnvelopeSerializer, Sender};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry policy for resending previously failed events.
///
/// Resend always works over a stable snapshot of the error log with a fixed
/// attempt budget per event, so a permanently dead endpoint costs a finite
/// number of requests instead of an infinite loop.
#[derive(Debug, Clone)]
pub struct ResendPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for ResendPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl ResendPolicy {
    /// Exponential backoff with a cap, optionally jittered.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2_u64.saturating_pow(attempt);
        let delay = Duration::from_millis(
            (self.base_delay.as_millis() as u64).saturating_mul(multiplier),
        );
        let capped = std::cmp::min(delay, self.max_delay);

        if self.jitter {
            apply_jitter(capped)
        } else {
            capped
        }
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let mut rng = rand::rng();
    let jitter_factor = rng.random_range(0.5..1.5); // ±50% jitter
    Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64)
}

/// Outcome of one resend pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResendReport {
    pub attempted: usize,
    pub recovered: usize,
    pub still_failing: usize,
    pub suppressed: usize,
}

/// Re-sends each event directly through the sender, bounded per event by the
/// policy's attempt budget. Events still failing after the budget go back into
/// the error log exactly once.
pub async fn resend_events<S: Sender>(
    sender: &S,
    serializer: &EnvelopeSerializer,
    policy: &ResendPolicy,
    events: Vec<LogEvent>,
    errors: &ErrorLog,
) -> ResendReport {
    let mut report = ResendReport {
        attempted: events.len(),
        ..ResendReport::default()
    };

    for event in events {
        match resend_one(sender, serializer, policy, &event).await {
            Ok(()) => report.recovered += 1,
            Err(reason) => {
                report.still_failing += 1;
                errors.record(ErrorKind::TransportFailure, reason, event);
            }
        }
    }

    report
}

async fn resend_one<S: Sender>(
    sender: &S,
    serializer: &EnvelopeSerializer,
    policy: &ResendPolicy,
    event: &LogEvent,
) -> Result<(), String> {
    let payload = serializer
        .serialize_event(event)
        .map_err(|e| e.to_string())?;

    let mut last_error = String::new();
    for attempt in 0..policy.max_attempts {
        // The first retry waits base_delay, the next one twice that, and so
        // on up to the cap.
        if attempt > 0 {
            tokio::time::sleep(policy.delay_for(attempt - 1)).await;
        }

        match sender.send(payload.clone()).await {
            Ok(()) => {
                debug!(message = event.message(), attempt, "resend succeeded");
                return Ok(());
            }
            Err(e) => {
                warn!(message = event.message(), attempt, error = %e, "resend attempt failed");
                last_error = e.to_string();
            }
        }
    }

    Err(last_error)
}
