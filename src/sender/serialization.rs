use crate::buffer::Batch;
use crate::domain::{LogEvent, Severity};
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

const ESTIMATED_ENVELOPE_SIZE: usize = 128; // bytes

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("JSON serialization failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Batch is empty")]
    EmptyBatch,
}

/// One HEC event envelope:
/// `{"event":{"message":...,"severity":...},"sourcetype":...}`
#[derive(Serialize)]
struct Envelope<'a> {
    event: EnvelopeBody<'a>,
    sourcetype: &'a str,
}

#[derive(Serialize)]
struct EnvelopeBody<'a> {
    message: &'a str,
    severity: Severity,
}

/// Builds HEC request bodies.
///
/// The collector accepts multiple envelopes concatenated in a single body,
/// which is how a whole batch travels as one request.
#[derive(Debug, Clone, Default)]
pub struct EnvelopeSerializer;

impl EnvelopeSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize_event(&self, event: &LogEvent) -> Result<Bytes, SerializationError> {
        let mut buffer = Vec::with_capacity(ESTIMATED_ENVELOPE_SIZE);
        write_envelope(&mut buffer, event)?;
        Ok(Bytes::from(buffer))
    }

    /// Serializes every event of the batch into one body, order preserved.
    pub fn serialize_batch(&self, batch: &Batch) -> Result<Bytes, SerializationError> {
        if batch.is_empty() {
            return Err(SerializationError::EmptyBatch);
        }

        let mut buffer = Vec::with_capacity(batch.len() * ESTIMATED_ENVELOPE_SIZE);
        for event in batch.events() {
            write_envelope(&mut buffer, event)?;
        }
        Ok(Bytes::from(buffer))
    }
}

fn write_envelope(buffer: &mut Vec<u8>, event: &LogEvent) -> Result<(), SerializationError> {
    let envelope = Envelope {
        event: EnvelopeBody {
            message: event.message(),
            severity: event.severity(),
        },
        sourcetype: event.sourcetype(),
    };
    serde_json::to_writer(&mut *buffer, &envelope)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BatchType;

    fn event(message: &str) -> LogEvent {
        LogEvent::new(message, Severity::Info, "test-app")
    }

    #[test]
    fn single_envelope_has_exact_shape() {
        let serializer = EnvelopeSerializer::new();
        let payload = serializer.serialize_event(&event("hello")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(value["event"]["message"], "hello");
        assert_eq!(value["event"]["severity"], "INFO");
        assert_eq!(value["sourcetype"], "test-app");
    }

    #[test]
    fn batch_of_k_events_produces_k_envelopes_in_order() {
        let serializer = EnvelopeSerializer::new();
        let events: Vec<_> = (0..5).map(|i| event(&format!("message-{i}"))).collect();
        let batch = Batch::new(events, BatchType::Forced);

        let payload = serializer.serialize_batch(&batch).unwrap();
        let envelopes: Vec<serde_json::Value> = serde_json::Deserializer::from_slice(&payload)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(envelopes.len(), 5);
        for (i, envelope) in envelopes.iter().enumerate() {
            assert_eq!(envelope["event"]["message"], format!("message-{i}"));
        }
    }

    #[test]
    fn empty_batch_is_an_error() {
        let serializer = EnvelopeSerializer::new();
        let batch = Batch::new(Vec::new(), BatchType::TimeBased);
        assert!(matches!(
            serializer.serialize_batch(&batch),
            Err(SerializationError::EmptyBatch)
        ));
    }
}
