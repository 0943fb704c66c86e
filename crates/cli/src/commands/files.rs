//! File share commands.

use std::path::Path;

use abc_retailers_admin::storage::StorageServices;

use super::CommandError;

/// Download `share/directory/name` to `output`.
///
/// # Errors
///
/// Returns `StorageError::NotFound` (wrapped) if the file does not exist,
/// or an I/O error if `output` cannot be written.
pub async fn get(
    storage: &StorageServices,
    share: &str,
    directory: &str,
    name: &str,
    output: &Path,
) -> Result<(), CommandError> {
    let content = storage.files().get_file(share, directory, name).await?;
    tokio::fs::write(output, &content).await?;
    tracing::info!(
        bytes = content.len(),
        output = %output.display(),
        "Downloaded {share}/{directory}/{name}"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abc_retailers_admin::storage::{CONTRACTS_SHARE, PAYMENTS_DIRECTORY, StorageError};

    use super::*;

    #[tokio::test]
    async fn test_get_writes_file() {
        let storage = StorageServices::in_memory();
        let name = storage
            .files()
            .put_file(CONTRACTS_SHARE, PAYMENTS_DIRECTORY, b"paid in full", "receipt.txt")
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("receipt.txt");
        get(&storage, CONTRACTS_SHARE, PAYMENTS_DIRECTORY, &name, &output)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"paid in full");
    }

    #[tokio::test]
    async fn test_get_missing_file() {
        let storage = StorageServices::in_memory();
        storage.ensure_provisioned().await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = get(
            &storage,
            CONTRACTS_SHARE,
            PAYMENTS_DIRECTORY,
            "nope.pdf",
            &dir.path().join("nope.pdf"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CommandError::Storage(StorageError::NotFound)));
    }
}
