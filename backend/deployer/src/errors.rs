//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] sfp_protocol::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing deployment record: {0}")]
    MissingRecord(String),
}

pub type Result<T> = std::result::Result<T, DeployerError>;
