//! Blob containers and the object upload adapter.

use std::sync::Arc;

use abc_retailers_core::{ObjectNaming, Visibility};
use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::Result;

#[async_trait]
pub trait BlobService: Send + Sync {
    /// Create `container`; succeeds if it already exists.
    async fn create_container(&self, container: &str, visibility: Visibility) -> Result<()>;

    /// Upload a block blob, overwriting any existing blob of that name.
    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;

    /// Delete a blob; succeeds if it does not exist.
    async fn delete_blob(&self, container: &str, name: &str) -> Result<()>;

    /// Address of a blob.
    fn blob_url(&self, container: &str, name: &str) -> String;
}

/// An uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub name: String,
    pub url: String,
}

/// Uploads binary payloads to blob containers.
#[derive(Clone)]
pub struct ObjectStore {
    blobs: Arc<dyn BlobService>,
}

impl ObjectStore {
    #[must_use]
    pub fn new(blobs: Arc<dyn BlobService>) -> Self {
        Self { blobs }
    }

    /// Create `container` with `visibility` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob service rejects the request.
    pub async fn ensure_container(&self, container: &str, visibility: Visibility) -> Result<()> {
        self.blobs.create_container(container, visibility).await
    }

    /// Upload `content` under a name derived from `original_filename`.
    ///
    /// The container is created first if needed. Returns the generated name
    /// and the object URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created or the upload
    /// fails.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn put_object(
        &self,
        container: &str,
        content: Vec<u8>,
        original_filename: &str,
        visibility: Visibility,
        naming: ObjectNaming,
    ) -> Result<StoredObject> {
        self.blobs.create_container(container, visibility).await?;

        let name = naming.object_name(original_filename, Utc::now());
        self.blobs
            .put_blob(container, &name, content, content_type_for(&name))
            .await?;

        let url = self.blobs.blob_url(container, &name);
        tracing::info!(container, name = %name, "Uploaded object");
        Ok(StoredObject { name, url })
    }

    /// Delete an object. Deleting a missing object succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob service rejects the request.
    pub async fn delete_object(&self, container: &str, name: &str) -> Result<()> {
        self.blobs.delete_blob(container, name).await
    }
}

/// Content type served for an object, by file extension.
#[must_use]
pub fn content_type_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_put_object_creates_container_and_returns_url() {
        let memory = Arc::new(MemoryStorage::new());
        let objects = ObjectStore::new(memory.clone());

        let stored = objects
            .put_object(
                "product-images",
                b"png-bytes".to_vec(),
                "photo.png",
                Visibility::PublicRead,
                ObjectNaming::RandomId,
            )
            .await
            .unwrap();

        assert!(stored.name.ends_with(".png"));
        assert!(stored.url.contains("/product-images/"));
        assert!(stored.url.ends_with(&stored.name));
        assert_eq!(
            memory.blob("product-images", &stored.name).await,
            Some(b"png-bytes".to_vec())
        );
        assert_eq!(
            memory.container_visibility("product-images").await,
            Some(Visibility::PublicRead)
        );
    }

    #[tokio::test]
    async fn test_delete_object_is_idempotent() {
        let memory = Arc::new(MemoryStorage::new());
        let objects = ObjectStore::new(memory.clone());
        let stored = objects
            .put_object(
                "payment-proofs",
                vec![1, 2, 3],
                "proof.pdf",
                Visibility::Private,
                ObjectNaming::Timestamped,
            )
            .await
            .unwrap();

        objects.delete_object("payment-proofs", &stored.name).await.unwrap();
        objects.delete_object("payment-proofs", &stored.name).await.unwrap();
        assert!(memory.blob("payment-proofs", &stored.name).await.is_none());
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("20240101_000000_proof.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }
}
