use crate::logs::LogBatch;
use async_trait::async_trait;

/// Downstream consumer of log batches.
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn consume(&self, batch: LogBatch) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sink rejected batch: {0}")]
    Rejected(String),
}
