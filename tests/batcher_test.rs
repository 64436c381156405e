mod common;

use common::{envelopes_in, RecordingSender};
use hec_forwarder::buffer::{BatchConfig, EventBatcher};
use hec_forwarder::domain::{ErrorKind, ErrorLog, LogEvent, Severity};
use std::time::Duration;
use tokio::time::sleep;

fn event(message: &str) -> LogEvent {
    LogEvent::new(message, Severity::Info, "test")
}

fn make_batcher(
    max_size: usize,
    max_wait: Duration,
) -> (EventBatcher<RecordingSender>, RecordingSender, ErrorLog) {
    let sender = RecordingSender::new();
    let errors = ErrorLog::new();
    let batcher = EventBatcher::new(
        BatchConfig { max_size, max_wait },
        sender.clone(),
        errors.clone(),
    );
    (batcher, sender, errors)
}

#[tokio::test]
async fn size_threshold_triggers_exactly_one_flush() {
    let (batcher, sender, _) = make_batcher(3, Duration::from_secs(10));
    batcher.start();

    batcher.enqueue(event("a")).await;
    batcher.enqueue(event("b")).await;
    assert!(sender.payloads().is_empty());
    assert_eq!(batcher.pending(), 2);

    batcher.enqueue(event("c")).await;

    let payloads = sender.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(envelopes_in(&payloads[0]).len(), 3);
    assert_eq!(batcher.pending(), 0);

    batcher.stop().await;
}

#[tokio::test(start_paused = true)]
async fn interval_flushes_partial_queue() {
    let (batcher, sender, _) = make_batcher(100, Duration::from_millis(500));
    batcher.start();

    batcher.enqueue(event("a")).await;
    batcher.enqueue(event("b")).await;
    sleep(Duration::from_millis(600)).await;

    let payloads = sender.payloads();
    assert_eq!(payloads.len(), 1);
    let envelopes = envelopes_in(&payloads[0]);
    assert_eq!(envelopes.len(), 2);
    assert_eq!(envelopes[0]["event"]["message"], "a");
    assert_eq!(envelopes[1]["event"]["message"], "b");
    assert_eq!(batcher.pending(), 0);

    batcher.stop().await;
}

#[tokio::test(start_paused = true)]
async fn timer_and_threshold_flushes_never_double_send() {
    // interval = 500ms, size threshold = 3, as in the scenario:
    // 2 events + 600ms wait -> one timer flush; 3 rapid events -> one
    // size flush; nothing is sent twice.
    let (batcher, sender, _) = make_batcher(3, Duration::from_millis(500));
    batcher.start();

    batcher.enqueue(event("a")).await;
    batcher.enqueue(event("b")).await;
    sleep(Duration::from_millis(600)).await;
    assert_eq!(sender.payloads().len(), 1);

    batcher.enqueue(event("c")).await;
    batcher.enqueue(event("d")).await;
    batcher.enqueue(event("e")).await;
    assert_eq!(sender.payloads().len(), 2);

    // Another interval passes with an empty queue: no extra flush.
    sleep(Duration::from_millis(600)).await;
    let payloads = sender.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(envelopes_in(&payloads[0]).len(), 2);
    assert_eq!(envelopes_in(&payloads[1]).len(), 3);

    batcher.stop().await;
}

#[tokio::test]
async fn stop_leaves_pending_events_queued() {
    let (batcher, sender, _) = make_batcher(10, Duration::from_secs(10));
    batcher.start();

    batcher.enqueue(event("a")).await;
    batcher.stop().await;

    assert!(!batcher.is_enabled());
    assert!(sender.payloads().is_empty());
    assert_eq!(batcher.pending(), 1);
}

#[tokio::test]
async fn disabled_batcher_sends_each_event_immediately() {
    let (batcher, sender, _) = make_batcher(10, Duration::from_secs(10));

    batcher.enqueue(event("solo")).await;

    let payloads = sender.payloads();
    assert_eq!(payloads.len(), 1);
    let envelopes = envelopes_in(&payloads[0]);
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0]["event"]["message"], "solo");
    assert_eq!(batcher.pending(), 0);
}

#[tokio::test]
async fn flush_forces_out_a_partial_batch() {
    let (batcher, sender, _) = make_batcher(10, Duration::from_secs(10));
    batcher.start();

    batcher.enqueue(event("a")).await;
    batcher.flush().await;

    let payloads = sender.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(envelopes_in(&payloads[0]).len(), 1);

    // Flushing an empty queue is a no-op.
    batcher.flush().await;
    assert_eq!(sender.payloads().len(), 1);

    batcher.stop().await;
}

#[tokio::test]
async fn send_failure_records_one_error_per_event() {
    let (batcher, sender, errors) = make_batcher(2, Duration::from_secs(10));
    sender.set_failing(true);
    batcher.start();

    batcher.enqueue(event("a")).await;
    batcher.enqueue(event("b")).await;

    // The drained events are dropped, never re-enqueued.
    assert_eq!(batcher.pending(), 0);
    assert!(sender.payloads().is_empty());

    let records = errors.snapshot();
    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.kind == ErrorKind::TransportFailure));
    assert_eq!(records[0].event.message(), "a");
    assert_eq!(records[1].event.message(), "b");

    // The batcher keeps working after a failed flush.
    sender.set_failing(false);
    batcher.enqueue(event("c")).await;
    batcher.enqueue(event("d")).await;
    assert_eq!(sender.payloads().len(), 1);

    batcher.stop().await;
}
