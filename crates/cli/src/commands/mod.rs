//! CLI command implementations.

use abc_retailers_admin::config::{ConfigError, StorageConfig};
use abc_retailers_admin::storage::{StorageError, StorageServices};
use thiserror::Error;

pub mod files;
pub mod provision;
pub mod queue;
pub mod seed;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Storage settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A storage call failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Writing a local file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The queue name is not one the app publishes to.
    #[error("Unknown queue: {0}. Valid queues: order-notifications, stock-updates")]
    UnknownQueue(String),
}

/// Storage services from the environment (and `.env` if present).
///
/// # Errors
///
/// Returns `CommandError::Config` if the storage settings are invalid.
pub fn connect() -> Result<StorageServices, CommandError> {
    dotenvy::dotenv().ok();

    let config = StorageConfig::from_env()?;
    tracing::info!(backend = ?config.backend, "Connecting to storage...");
    Ok(StorageServices::from_config(&config)?)
}
