pub mod client;
pub mod serialization;

pub use client::{ClientConfig, ClientError, ConnectionStats, HecClient, Sender};
pub use serialization::{EnvelopeSerializer, SerializationError};
