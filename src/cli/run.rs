use crate::config::{load_config, Config, OutputConfig};
use crate::receiver::AuditTrailReceiver;
use crate::sink::{JsonLinesSink, LogSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("sink error: {0}")]
    Sink(#[from] crate::sink::SinkError),

    #[error("receiver error: {0}")]
    Receiver(#[from] crate::receiver::ReceiverError),

    #[error("signal error: {0}")]
    Signal(#[from] std::io::Error),

    #[error(
        "config not found; searched ~/.config/audit-trail-receiver/config.yml and \
         /etc/audit-trail-receiver/config.yml. Use --config <path> to specify a config file, \
         or run 'audit-trail-receiver config init' to generate one"
    )]
    ConfigNotFound,
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), RunError> {
    let config_path = config_path.ok_or(RunError::ConfigNotFound)?;

    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(&config_path)?;

    run_receiver(&config).await
}

pub async fn build_sink(output: &OutputConfig) -> Result<Arc<dyn LogSink>, RunError> {
    let sink: Arc<dyn LogSink> = match output {
        OutputConfig::Stdout => Arc::new(JsonLinesSink::stdout()),
        OutputConfig::File { path } => {
            info!(path = %path.display(), "Writing logs to file");
            Arc::new(JsonLinesSink::file(Path::new(path)).await?)
        }
    };
    Ok(sink)
}

async fn run_receiver(config: &Config) -> Result<(), RunError> {
    let sink = build_sink(&config.output).await?;
    let mut receiver = AuditTrailReceiver::from_config(config, sink)?;

    info!(
        organization_id = %config.scaleway.organization_id,
        region = %config.scaleway.region,
        max_events_per_request = config.receiver.max_events_per_request,
        "Receiver configured"
    );

    receiver.start()?;
    info!("Receiver started, press Ctrl+C to shutdown");

    let signal_result = signal::ctrl_c().await;
    info!("Shutdown signal received");

    receiver.shutdown().await?;
    signal_result?;

    info!("Shutdown complete");
    Ok(())
}
