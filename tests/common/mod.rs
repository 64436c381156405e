#![allow(dead_code)]

use bytes::Bytes;
use hec_forwarder::sender::{ClientError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Test double that records every payload it successfully "sends" and can be
/// flipped into a failing state.
#[derive(Clone, Default)]
pub struct RecordingSender {
    payloads: Arc<Mutex<Vec<Bytes>>>,
    attempts: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Successfully delivered payloads, in send order.
    pub fn payloads(&self) -> Vec<Bytes> {
        self.payloads.lock().clone()
    }

    /// Total send attempts, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Sender for RecordingSender {
    async fn send(&self, payload: Bytes) -> Result<(), ClientError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::HttpError {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        self.payloads.lock().push(payload);
        Ok(())
    }
}

/// Splits a request body into the JSON envelopes concatenated inside it.
pub fn envelopes_in(payload: &Bytes) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_slice(payload)
        .into_iter()
        .collect::<Result<_, _>>()
        .expect("payload contains valid concatenated JSON envelopes")
}
