use thiserror::Error;
use tokio::task::JoinError;

use pcapwatch_config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Task failed: {0}")]
    Task(#[from] JoinError),
}
