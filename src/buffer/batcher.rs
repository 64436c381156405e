use super::{Batch, BatchConfig, BatchType};
use crate::domain::{ErrorKind, ErrorLog, LogEvent};
use crate::sender::{EnvelopeSerializer, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Size- and time-triggered batching of log events in front of a [`Sender`].
///
/// One background task per batcher drives time-based flushes; `enqueue` can be
/// called from any task. Append, threshold check and drain happen as a single
/// atomic step under the queue lock; serialization and network I/O always run
/// after the lock is released.
pub struct EventBatcher<S: Sender> {
    shared: Arc<Shared<S>>,
    worker: Mutex<Option<WorkerHandle>>,
}

struct Shared<S> {
    queue: Mutex<VecDeque<LogEvent>>,
    config: BatchConfig,
    enabled: AtomicBool,
    sender: S,
    serializer: EnvelopeSerializer,
    errors: ErrorLog,
}

struct WorkerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<S: Sender> EventBatcher<S> {
    pub fn new(config: BatchConfig, sender: S, errors: ErrorLog) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                config,
                enabled: AtomicBool::new(false),
                sender,
                serializer: EnvelopeSerializer::new(),
                errors,
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    pub fn sender(&self) -> &S {
        &self.shared.sender
    }

    /// Number of events currently waiting in the queue.
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Appends an event to the pending queue, flushing when the size
    /// threshold is reached. With batching disabled the event bypasses the
    /// queue and is sent on its own. Never fails; send failures land in the
    /// error log.
    pub async fn enqueue(&self, event: LogEvent) {
        if !self.is_enabled() {
            self.shared.send_single(event).await;
            return;
        }

        let drained = {
            let mut queue = self.shared.queue.lock();
            queue.push_back(event);
            if queue.len() >= self.shared.config.max_size {
                Some(queue.drain(..).collect::<Vec<_>>())
            } else {
                None
            }
        };

        if let Some(events) = drained {
            self.shared
                .dispatch(Batch::new(events, BatchType::SizeBased))
                .await;
        }
    }

    /// Enables batching and spawns the recurring background flush task.
    /// Idempotent while the task is running.
    pub fn start(&self) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }
        self.shared.enabled.store(true, Ordering::Release);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(shared.config.max_wait);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !shared.enabled.load(Ordering::Acquire) {
                            break;
                        }
                        shared.flush(BatchType::TimeBased).await;
                    }
                }
            }
            debug!("batch worker stopped");
        });

        *worker = Some(WorkerHandle { cancel, handle });
    }

    /// Drains and sends whatever is pending right now.
    pub async fn flush(&self) {
        self.shared.flush(BatchType::Forced).await;
    }

    /// Disables batching and joins the background task with a bounded wait.
    /// Pending events stay queued; they are not flushed on stop.
    pub async fn stop(&self) {
        self.shared.enabled.store(false, Ordering::Release);
        let worker = self.worker.lock().take();
        if let Some(WorkerHandle { cancel, handle }) = worker {
            cancel.cancel();
            if timeout(SHUTDOWN_JOIN_TIMEOUT, handle).await.is_err() {
                warn!("batch worker did not stop within {SHUTDOWN_JOIN_TIMEOUT:?}");
            }
        }
    }
}

impl<S: Sender> Shared<S> {
    async fn flush(&self, batch_type: BatchType) {
        let events: Vec<LogEvent> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };
        if events.is_empty() {
            return;
        }
        self.dispatch(Batch::new(events, batch_type)).await;
    }

    async fn dispatch(&self, batch: Batch) {
        let batch_id = batch.id().to_string();
        let count = batch.len();
        let batch_type = batch.batch_type();

        let payload = match self.serializer.serialize_batch(&batch) {
            Ok(payload) => payload,
            Err(e) => {
                let reason = e.to_string();
                self.record_failures(batch.into_events(), &reason);
                return;
            }
        };

        debug!(%batch_id, events = count, ?batch_type, "sending batch");
        match self.sender.send(payload).await {
            Ok(()) => info!(%batch_id, events = count, "batch sent"),
            Err(e) => {
                warn!(%batch_id, events = count, error = %e, "batch send failed");
                let reason = e.to_string();
                self.record_failures(batch.into_events(), &reason);
            }
        }
    }

    async fn send_single(&self, event: LogEvent) {
        let payload = match self.serializer.serialize_event(&event) {
            Ok(payload) => payload,
            Err(e) => {
                let reason = e.to_string();
                self.errors
                    .record(ErrorKind::TransportFailure, reason, event);
                return;
            }
        };

        if let Err(e) = self.sender.send(payload).await {
            warn!(message = event.message(), error = %e, "event send failed");
            let reason = e.to_string();
            self.errors
                .record(ErrorKind::TransportFailure, reason, event);
        }
    }

    // Dropped events are never re-enqueued; they move to the error log, one
    // record per event.
    fn record_failures(&self, events: Vec<LogEvent>, reason: &str) {
        for event in events {
            self.errors
                .record(ErrorKind::TransportFailure, reason, event);
        }
    }
}
