//! Storage access for the storage account's table, blob, queue and file
//! services.
//!
//! # Layout
//!
//! Each service is a trait with two implementations:
//!
//! - [`azure::AzureStorage`] - REST calls signed with the account key
//! - [`memory::MemoryStorage`] - process-local maps for tests and development
//!
//! Handlers never use the traits directly. They go through the typed
//! adapters bundled in [`StorageServices`]:
//!
//! - [`EntityStore`] - keyed records with optimistic concurrency
//! - [`ObjectStore`] - blob uploads returning the object URL
//! - [`MessageQueues`] - enqueue and receive-then-delete
//! - [`FileShares`] - file share upload and download
//!
//! # Provisioning
//!
//! Constructing [`StorageServices`] performs no I/O. Tables, containers,
//! queues and the file share are created by
//! [`StorageServices::ensure_provisioned`], which is idempotent.

pub mod azure;
pub mod blob;
pub mod entity;
pub mod file_share;
pub mod memory;
pub mod queue;
pub mod table;

use std::sync::Arc;

use abc_retailers_core::{Customer, RecordKind, Visibility};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crate::config::{StorageBackend, StorageConfig};

pub use azure::AzureStorage;
pub use blob::{BlobService, ObjectStore, StoredObject};
pub use entity::EntityStore;
pub use file_share::{FileShareService, FileShares};
pub use memory::MemoryStorage;
pub use queue::{MessageQueues, QueueMessage, QueueService};
pub use table::{Continuation, Properties, TablePage, TableRow, TableService};

/// Container for product images, readable anonymously.
pub const PRODUCT_IMAGES_CONTAINER: &str = "product-images";
/// Container for proof-of-payment uploads.
pub const PAYMENT_PROOFS_CONTAINER: &str = "payment-proofs";
/// Queue for order placement and status change events.
pub const ORDER_NOTIFICATIONS_QUEUE: &str = "order-notifications";
/// Queue for stock level change events.
pub const STOCK_UPDATES_QUEUE: &str = "stock-updates";
/// File share holding contract documents.
pub const CONTRACTS_SHARE: &str = "contracts";
/// Directory of `contracts` holding payment proofs.
pub const PAYMENTS_DIRECTORY: &str = "payments";

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file requested from a share does not exist.
    #[error("not found")]
    NotFound,

    /// The record changed or was deleted since it was read.
    #[error("The record was modified by another process. Please refresh and try again.")]
    ConcurrencyConflict,

    /// A record with the same identity already exists.
    #[error("a record with this identity already exists")]
    AlreadyExists,

    /// The HTTP request to the storage service failed.
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage service answered with an unexpected status.
    #[error("storage service returned {status} {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// A record or payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data does not match the expected record shape.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The storage account is misconfigured.
    #[error("storage configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// The storage adapters used by the application.
///
/// Cheap to clone; every adapter holds an `Arc` to the shared backend.
#[derive(Clone)]
pub struct StorageServices {
    entities: EntityStore,
    objects: ObjectStore,
    queues: MessageQueues,
    files: FileShares,
}

impl StorageServices {
    /// Build the services selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the Azure backend is selected and the
    /// connection string is missing or malformed.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::Azure => {
                let connection_string = config.connection_string.as_ref().ok_or_else(|| {
                    StorageError::Config("AZURE_STORAGE_CONNECTION_STRING is not set".to_string())
                })?;
                let azure = AzureStorage::from_connection_string(connection_string.expose_secret())?;
                Ok(Self::from_backend(Arc::new(azure)))
            }
            StorageBackend::Memory => Ok(Self::in_memory()),
        }
    }

    /// Services backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStorage::new()))
    }

    /// Services sharing one backend that implements all four services.
    #[must_use]
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: TableService + BlobService + QueueService + FileShareService + 'static,
    {
        Self {
            entities: EntityStore::new(backend.clone()),
            objects: ObjectStore::new(backend.clone()),
            queues: MessageQueues::new(backend.clone()),
            files: FileShares::new(backend),
        }
    }

    /// Replace the table service, keeping the other three.
    #[must_use]
    pub fn with_tables(mut self, tables: Arc<dyn TableService>) -> Self {
        self.entities = EntityStore::new(tables);
        self
    }

    #[must_use]
    pub const fn entities(&self) -> &EntityStore {
        &self.entities
    }

    #[must_use]
    pub const fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    #[must_use]
    pub const fn queues(&self) -> &MessageQueues {
        &self.queues
    }

    #[must_use]
    pub const fn files(&self) -> &FileShares {
        &self.files
    }

    /// Create every table, container, queue and share the app uses.
    ///
    /// Safe to call repeatedly; existing resources are left untouched.
    ///
    /// # Errors
    ///
    /// Returns the first failure from the storage services.
    #[instrument(skip(self))]
    pub async fn ensure_provisioned(&self) -> Result<()> {
        for kind in RecordKind::PROVISIONED {
            self.entities.ensure_table(kind).await?;
        }

        self.objects
            .ensure_container(PRODUCT_IMAGES_CONTAINER, Visibility::PublicRead)
            .await?;
        self.objects
            .ensure_container(PAYMENT_PROOFS_CONTAINER, Visibility::Private)
            .await?;

        for queue in [ORDER_NOTIFICATIONS_QUEUE, STOCK_UPDATES_QUEUE] {
            self.queues.ensure_queue(queue).await?;
        }

        self.files
            .ensure_directory(CONTRACTS_SHARE, PAYMENTS_DIRECTORY)
            .await?;

        tracing::info!("Storage resources provisioned");
        Ok(())
    }

    /// Round-trip to the table service, for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the table service cannot be reached.
    pub async fn ping(&self) -> Result<()> {
        self.entities
            .find::<Customer>("__readiness_probe__")
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_provisioned_is_idempotent() {
        let memory = Arc::new(MemoryStorage::new());
        let services = StorageServices::from_backend(memory.clone());

        services.ensure_provisioned().await.unwrap();
        services.ensure_provisioned().await.unwrap();

        assert_eq!(
            memory.container_visibility(PRODUCT_IMAGES_CONTAINER).await,
            Some(Visibility::PublicRead)
        );
        assert_eq!(
            memory.container_visibility(PAYMENT_PROOFS_CONTAINER).await,
            Some(Visibility::Private)
        );
        assert!(services.entities().list::<Customer>().await.unwrap().is_empty());
        assert!(services.ping().await.is_ok());
    }

    #[test]
    fn test_memory_config_builds_without_io() {
        assert!(StorageServices::from_config(&StorageConfig::memory()).is_ok());
    }

    #[test]
    fn test_azure_config_requires_connection_string() {
        let config = StorageConfig {
            backend: StorageBackend::Azure,
            connection_string: None,
        };
        assert!(matches!(
            StorageServices::from_config(&config),
            Err(StorageError::Config(_))
        ));
    }

    #[test]
    fn test_conflict_message_is_user_facing() {
        assert_eq!(
            StorageError::ConcurrencyConflict.to_string(),
            "The record was modified by another process. Please refresh and try again."
        );
    }
}
