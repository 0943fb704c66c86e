//! Storage account connection strings.
//!
//! Supports the standard account form:
//!
//! ```text
//! DefaultEndpointsProtocol=https;AccountName=abc;AccountKey=...;EndpointSuffix=core.windows.net
//! ```
//!
//! explicit `BlobEndpoint` / `QueueEndpoint` / `TableEndpoint` / `FileEndpoint`
//! overrides, and `UseDevelopmentStorage=true` for the Azurite emulator.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};

use crate::storage::{Result, StorageError};

const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
const DEV_ACCOUNT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

/// Account name, key and service endpoints.
///
/// Endpoints never end with `/`. Implements `Debug` manually to redact the
/// account key.
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    pub key: SecretString,
    pub blob_endpoint: String,
    pub queue_endpoint: String,
    pub table_endpoint: String,
    /// Absent for the emulator, which has no file service.
    pub file_endpoint: Option<String>,
}

impl std::fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"[REDACTED]")
            .field("blob_endpoint", &self.blob_endpoint)
            .field("queue_endpoint", &self.queue_endpoint)
            .field("table_endpoint", &self.table_endpoint)
            .field("file_endpoint", &self.file_endpoint)
            .finish()
    }
}

impl StorageAccount {
    /// Parse a connection string.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the account name or key is missing,
    /// the key is not base64, or no endpoint can be derived.
    pub fn parse(connection_string: &str) -> Result<Self> {
        let settings: HashMap<String, &str> = connection_string
            .split(';')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
            .collect();

        if settings
            .get("usedevelopmentstorage")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(Self::development());
        }

        let name = settings
            .get("accountname")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| config_error("AccountName is missing"))?
            .to_string();
        let key = settings
            .get("accountkey")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| config_error("AccountKey is missing"))?;
        BASE64
            .decode(key)
            .map_err(|_| config_error("AccountKey is not valid base64"))?;

        let protocol = settings
            .get("defaultendpointsprotocol")
            .copied()
            .unwrap_or("https");
        let suffix = settings
            .get("endpointsuffix")
            .copied()
            .unwrap_or("core.windows.net");
        let endpoint = |explicit: &str, service: &str| {
            settings.get(explicit).map_or_else(
                || format!("{protocol}://{name}.{service}.{suffix}"),
                |url| url.trim_end_matches('/').to_string(),
            )
        };

        Ok(Self {
            blob_endpoint: endpoint("blobendpoint", "blob"),
            queue_endpoint: endpoint("queueendpoint", "queue"),
            table_endpoint: endpoint("tableendpoint", "table"),
            file_endpoint: Some(endpoint("fileendpoint", "file")),
            key: SecretString::from((*key).to_string()),
            name,
        })
    }

    /// The well-known Azurite account on its default ports.
    #[must_use]
    pub fn development() -> Self {
        Self {
            name: DEV_ACCOUNT_NAME.to_string(),
            key: SecretString::from(DEV_ACCOUNT_KEY.to_string()),
            blob_endpoint: format!("http://127.0.0.1:10000/{DEV_ACCOUNT_NAME}"),
            queue_endpoint: format!("http://127.0.0.1:10001/{DEV_ACCOUNT_NAME}"),
            table_endpoint: format!("http://127.0.0.1:10002/{DEV_ACCOUNT_NAME}"),
            file_endpoint: None,
        }
    }

    /// Decoded account key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the key is not base64.
    pub fn key_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.key.expose_secret())
            .map_err(|_| config_error("AccountKey is not valid base64"))
    }
}

fn config_error(message: &str) -> StorageError {
    StorageError::Config(format!("connection string: {message}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_connection_string() {
        let account = StorageAccount::parse(
            "DefaultEndpointsProtocol=https;AccountName=abcretail;AccountKey=c2VjcmV0a2V5;EndpointSuffix=core.windows.net",
        )
        .unwrap();

        assert_eq!(account.name, "abcretail");
        assert_eq!(account.blob_endpoint, "https://abcretail.blob.core.windows.net");
        assert_eq!(account.table_endpoint, "https://abcretail.table.core.windows.net");
        assert_eq!(
            account.file_endpoint.as_deref(),
            Some("https://abcretail.file.core.windows.net")
        );
        assert_eq!(account.key_bytes().unwrap(), b"secretkey");
    }

    #[test]
    fn test_parse_explicit_endpoints() {
        let account = StorageAccount::parse(
            "AccountName=devstoreaccount1;AccountKey=c2VjcmV0a2V5;BlobEndpoint=http://localhost:10000/devstoreaccount1/;QueueEndpoint=http://localhost:10001/devstoreaccount1",
        )
        .unwrap();

        assert_eq!(account.blob_endpoint, "http://localhost:10000/devstoreaccount1");
        assert_eq!(account.queue_endpoint, "http://localhost:10001/devstoreaccount1");
        assert_eq!(
            account.table_endpoint,
            "https://devstoreaccount1.table.core.windows.net"
        );
    }

    #[test]
    fn test_use_development_storage() {
        let account = StorageAccount::parse("UseDevelopmentStorage=true").unwrap();
        assert_eq!(account.name, "devstoreaccount1");
        assert_eq!(account.table_endpoint, "http://127.0.0.1:10002/devstoreaccount1");
        assert!(account.file_endpoint.is_none());
        assert!(account.key_bytes().is_ok());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = StorageAccount::parse("AccountName=abc").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn test_invalid_key_is_config_error() {
        let err = StorageAccount::parse("AccountName=abc;AccountKey=***").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let account = StorageAccount::development();
        let debug = format!("{account:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(DEV_ACCOUNT_KEY));
    }
}
