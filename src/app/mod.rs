//! Binary entry point: a small harness that fires sample events through the
//! logger, mirroring a mobile client hammering the collector.

use crate::domain::Severity;
use crate::logger::{HecLogger, LoggerConfig};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Sends sample log events to a Splunk HTTP Event Collector", long_about = None)]
pub struct Cli {
    /// HEC endpoint URL
    #[arg(
        long,
        env = "HEC_ENDPOINT",
        default_value = "https://localhost:8088/services/collector/event"
    )]
    pub endpoint: String,

    /// HEC token
    #[arg(long, env = "HEC_TOKEN", default_value = "")]
    pub token: String,

    /// Severity level stamped on the sample events
    #[arg(long, env = "HEC_LEVEL", default_value = "INFO")]
    pub level: Severity,

    /// Sourcetype tag attached to the events
    #[arg(long, env = "HEC_SOURCETYPE", default_value = "Mobile Application")]
    pub sourcetype: String,

    /// Allow a plain-http endpoint without the TLS warning
    #[arg(long, env = "HEC_NO_TLS")]
    pub no_tls: bool,

    /// Queue events and flush them in batches
    #[arg(long, env = "HEC_BATCHING")]
    pub batching: bool,

    /// Events per batch before an immediate flush
    #[arg(long, env = "HEC_BATCH_SIZE", default_value = "100")]
    pub batch_size: usize,

    /// Flush interval in milliseconds
    #[arg(long, env = "HEC_BATCH_INTERVAL_MS", default_value = "500")]
    pub batch_interval_ms: u64,

    /// Number of sample events to send
    #[arg(long, env = "HEC_EVENT_COUNT", default_value = "10")]
    pub count: usize,

    /// Configuration file path (overrides the flags above)
    #[arg(long, env = "HEC_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Cli {
    pub fn logger_config(&self) -> anyhow::Result<LoggerConfig> {
        if let Some(path) = &self.config_file {
            return LoggerConfig::from_file(path)
                .with_context(|| format!("failed to load config file {}", path.display()));
        }

        let config = LoggerConfig {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            tls: !self.no_tls,
            level: self.level,
            sourcetype: self.sourcetype.clone(),
            batching: self.batching,
            batch_size: self.batch_size,
            batch_interval: Duration::from_millis(self.batch_interval_ms),
        };
        config.validate()?;
        Ok(config)
    }
}

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let count = cli.count;
    let config = cli.logger_config()?;
    let batching = config.batching;

    let logger = HecLogger::new(config).context("failed to build HEC logger")?;

    let started = Instant::now();
    for i in 1..=count {
        logger
            .log(format!(
                "This is test event {i} out of {count}. It has been {} millis since requests started.",
                started.elapsed().as_millis()
            ))
            .await;
    }

    if batching {
        logger.flush().await;
        logger.disable_batching().await;
    }

    let errors = logger.errors();
    info!(
        sent = count,
        failed = errors.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "sample run finished"
    );
    for record in &errors {
        warn!(reason = %record.reason, message = record.event.message(), "event was not delivered");
    }

    Ok(())
}
