//! Network file share adapter.

use std::sync::Arc;

use abc_retailers_core::ObjectNaming;
use async_trait::async_trait;
use chrono::Utc;
use tracing::instrument;

use super::Result;

/// Largest range the file service accepts in one write.
pub const MAX_RANGE_BYTES: usize = 4 * 1024 * 1024;

/// File service primitives. An empty `directory` is the share root.
#[async_trait]
pub trait FileShareService: Send + Sync {
    /// Create `share`; succeeds if it already exists.
    async fn create_share(&self, share: &str) -> Result<()>;

    /// Create `directory` in `share`; succeeds if it already exists.
    async fn create_directory(&self, share: &str, directory: &str) -> Result<()>;

    /// Create (or truncate) a file of `length` zero bytes.
    async fn create_file(&self, share: &str, directory: &str, name: &str, length: u64) -> Result<()>;

    /// Write `content` at `offset`. At most [`MAX_RANGE_BYTES`] per call.
    async fn put_range(
        &self,
        share: &str,
        directory: &str,
        name: &str,
        offset: u64,
        content: &[u8],
    ) -> Result<()>;

    /// Full content of a file. Fails with `NotFound` when absent.
    async fn get_file(&self, share: &str, directory: &str, name: &str) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct FileShares {
    files: Arc<dyn FileShareService>,
}

impl FileShares {
    #[must_use]
    pub fn new(files: Arc<dyn FileShareService>) -> Self {
        Self { files }
    }

    /// Create `share` and, unless empty, `directory` inside it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file service rejects either request.
    pub async fn ensure_directory(&self, share: &str, directory: &str) -> Result<()> {
        self.files.create_share(share).await?;
        if !directory.is_empty() {
            self.files.create_directory(share, directory).await?;
        }
        Ok(())
    }

    /// Store `content` as `<yyyyMMdd_HHmmss>_<original_filename>` and return
    /// the generated name.
    ///
    /// The file is created at its final length before the content is
    /// written; a failed write leaves a zero-filled file behind.
    ///
    /// # Errors
    ///
    /// Returns an error if the share, directory or file cannot be written.
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn put_file(
        &self,
        share: &str,
        directory: &str,
        content: &[u8],
        original_filename: &str,
    ) -> Result<String> {
        self.ensure_directory(share, directory).await?;

        let name = ObjectNaming::Timestamped.object_name(original_filename, Utc::now());
        self.files
            .create_file(share, directory, &name, content.len() as u64)
            .await?;

        let mut offset = 0u64;
        for chunk in content.chunks(MAX_RANGE_BYTES) {
            self.files
                .put_range(share, directory, &name, offset, chunk)
                .await?;
            offset += chunk.len() as u64;
        }

        tracing::info!(share, directory, name = %name, "Uploaded file");
        Ok(name)
    }

    /// Download a file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file does not exist.
    #[instrument(skip(self))]
    pub async fn get_file(&self, share: &str, directory: &str, filename: &str) -> Result<Vec<u8>> {
        self.files.get_file(share, directory, filename).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};

    #[tokio::test]
    async fn test_put_then_get_round_trips() {
        let shares = FileShares::new(Arc::new(MemoryStorage::new()));
        let name = shares
            .put_file("contracts", "payments", b"%PDF-1.7", "proof.pdf")
            .await
            .unwrap();

        assert!(name.ends_with("_proof.pdf"));
        let content = shares.get_file("contracts", "payments", &name).await.unwrap();
        assert_eq!(content, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_share_root_when_directory_empty() {
        let shares = FileShares::new(Arc::new(MemoryStorage::new()));
        let name = shares.put_file("contracts", "", b"x", "a.txt").await.unwrap();
        assert_eq!(shares.get_file("contracts", "", &name).await.unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_large_content_is_written_in_ranges() {
        let shares = FileShares::new(Arc::new(MemoryStorage::new()));
        let content: Vec<u8> = (0..MAX_RANGE_BYTES + 10).map(|i| (i % 251) as u8).collect();
        let name = shares
            .put_file("contracts", "payments", &content, "big.bin")
            .await
            .unwrap();
        assert_eq!(
            shares.get_file("contracts", "payments", &name).await.unwrap(),
            content
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let shares = FileShares::new(Arc::new(MemoryStorage::new()));
        shares.ensure_directory("contracts", "payments").await.unwrap();
        let err = shares
            .get_file("contracts", "payments", "nope.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
