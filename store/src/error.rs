//! Unified error handling for the store.

use crate::config::ConfigError;

/// Store error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Engine error: {0}")]
    Engine(#[from] matchsync_engine::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sync failed: {0}")]
    SyncFailed(String),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
