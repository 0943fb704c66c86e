//! Storage provisioning command.

use abc_retailers_admin::storage::StorageServices;

use super::CommandError;

/// Create every storage resource the app uses. Safe to re-run.
///
/// # Errors
///
/// Returns the first storage failure.
pub async fn run(storage: &StorageServices) -> Result<(), CommandError> {
    tracing::info!("Provisioning storage resources...");
    storage.ensure_provisioned().await?;
    tracing::info!("Storage provisioning complete!");
    Ok(())
}
