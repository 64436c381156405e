use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Request timeout: {0}")]
    RequestTimeout(String),
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },
    #[error("Payload error: {0}")]
    PayloadError(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

/// Destination for serialized envelopes. Every send attempt produces a binary
/// outcome; the batching engine turns failures into error records.
pub trait Sender: Send + Sync + 'static {
    fn send(&self, payload: Bytes) -> impl Future<Output = Result<(), ClientError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub token: String,
    pub tls: bool,
    pub timeout: Duration,
    pub connection_timeout: Duration,
    pub max_connections: usize,
    pub keep_alive_timeout: Duration,
    pub user_agent: String,
    pub enable_compression: bool,
    /// Payloads at or above this size are gzipped before the POST.
    pub compression_threshold: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://localhost:8088/services/collector/event".to_string(),
            token: String::new(),
            tls: true,
            timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            max_connections: 10,
            keep_alive_timeout: Duration::from_secs(60),
            user_agent: "hec-forwarder/0.1.0".to_string(),
            enable_compression: true,
            compression_threshold: 16 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

#[derive(Debug, Default)]
struct ClientStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
}

impl ClientStats {
    fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// HTTP client for a Splunk HTTP Event Collector endpoint.
///
/// Carries `Authorization: Splunk <token>` on every request and posts
/// serialized envelopes as a single body per batch.
#[derive(Debug, Clone)]
pub struct HecClient {
    client: Client,
    config: ClientConfig,
    endpoint_url: Url,
    stats: Arc<ClientStats>,
}

impl HecClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint_url: Url = config
            .endpoint
            .parse()
            .map_err(|e| ClientError::InvalidConfiguration(format!("Invalid endpoint URL: {e}")))?;

        // The TLS flag documents intent only; certificate policy is the
        // deployment's problem. A plain-http endpoint with TLS requested is
        // worth a warning.
        if config.tls && endpoint_url.scheme() == "http" {
            tracing::warn!(endpoint = %endpoint_url, "TLS requested but endpoint scheme is http");
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Splunk {}", config.token))
            .map_err(|e| ClientError::InvalidConfiguration(format!("Invalid token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connection_timeout)
            .pool_max_idle_per_host(config.max_connections)
            .pool_idle_timeout(config.keep_alive_timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ClientError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            config,
            endpoint_url,
            stats: Arc::new(ClientStats::default()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn connection_stats(&self) -> ConnectionStats {
        ConnectionStats {
            total_requests: self.stats.total_requests.load(Ordering::Relaxed),
            successful_requests: self.stats.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.stats.failed_requests.load(Ordering::Relaxed),
        }
    }

    async fn post(&self, payload: Bytes) -> Result<(), ClientError> {
        let compress =
            self.config.enable_compression && payload.len() >= self.config.compression_threshold;

        let mut request = self
            .client
            .post(self.endpoint_url.clone())
            .header(CONTENT_TYPE, "application/json");

        let body = if compress {
            request = request.header(CONTENT_ENCODING, "gzip");
            Bytes::from(gzip(&payload)?)
        } else {
            payload
        };

        let response = request.body(body).send().await.map_err(|e| {
            self.stats.record_request(false);
            if e.is_timeout() {
                ClientError::RequestTimeout(e.to_string())
            } else {
                ClientError::NetworkError(e)
            }
        })?;

        let success = response.status().is_success();
        self.stats.record_request(success);

        if success {
            Ok(())
        } else {
            Err(ClientError::HttpError {
                status: response.status().as_u16(),
                message: format!("Event collector rejected request: {}", response.status()),
            })
        }
    }
}

impl Sender for HecClient {
    async fn send(&self, payload: Bytes) -> Result<(), ClientError> {
        self.post(payload).await
    }
}

fn gzip(payload: &[u8]) -> Result<Vec<u8>, ClientError> {
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
    encoder
        .write_all(payload)
        .map_err(|e| ClientError::PayloadError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ClientError::PayloadError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_endpoint() {
        let config = ClientConfig {
            endpoint: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            HecClient::new(config),
            Err(ClientError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn stats_start_at_zero() {
        let client = HecClient::new(ClientConfig::default()).unwrap();
        let stats = client.connection_stats();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.successful_requests, 0);
        assert_eq!(stats.failed_requests, 0);
    }
}
