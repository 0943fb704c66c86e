//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AZURE_STORAGE_CONNECTION_STRING` - Storage account connection string
//!   (only when `STORAGE_BACKEND=azure`)
//!
//! ## Optional
//! - `STORAGE_BACKEND` - `azure` or `memory` (default: azure)
//! - `APP_HOST` - Bind address (default: 127.0.0.1)
//! - `APP_PORT` - Listen port (default: 3000)
//! - `APP_BASE_URL` - Public URL of the app (default: <http://localhost:3000>)
//! - `MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 10 MiB)
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 1.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which storage implementation backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Azure Storage REST APIs (or Azurite).
    #[default]
    Azure,
    /// Process-local maps, lost on restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected 'azure' or 'memory', got '{other}'")),
        }
    }
}

/// Storage account configuration.
///
/// Implements `Debug` manually to redact the connection string, which
/// carries the account key.
#[derive(Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Connection string (contains the account key)
    pub connection_string: Option<SecretString>,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl StorageConfig {
    /// In-memory storage, used by tests and local development.
    #[must_use]
    pub const fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            connection_string: None,
        }
    }

    /// Load storage settings from the environment.
    ///
    /// Does not read `.env`; callers load it first.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend name is invalid or the Azure
    /// backend is selected without a connection string.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = get_env_or_default("STORAGE_BACKEND", "azure")
            .parse::<StorageBackend>()
            .map_err(|e| ConfigError::InvalidEnvVar("STORAGE_BACKEND".to_string(), e))?;

        let connection_string = match backend {
            StorageBackend::Azure => Some(get_required_secret("AZURE_STORAGE_CONNECTION_STRING")?),
            StorageBackend::Memory => None,
        };

        Ok(Self {
            backend,
            connection_string,
        })
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Storage account configuration
    pub storage: StorageConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL (decides whether session cookies are `Secure`)
    pub base_url: String,
    /// Largest accepted request body, in bytes
    pub max_upload_bytes: usize,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage = StorageConfig::from_env()?;
        let host = get_env_or_default("APP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("APP_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("APP_BASE_URL", "http://localhost:3000");
        let max_upload_bytes = match get_optional_env("MAX_UPLOAD_BYTES") {
            Some(value) => value.parse::<usize>().map_err(|e| {
                ConfigError::InvalidEnvVar("MAX_UPLOAD_BYTES".to_string(), e.to_string())
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let log_json = get_optional_env("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            storage,
            host,
            port,
            base_url,
            max_upload_bytes,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for running against the in-memory backend.
    #[must_use]
    pub fn local_memory() -> Self {
        Self {
            storage: StorageConfig::memory(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the app is served over HTTPS.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("azure".parse::<StorageBackend>(), Ok(StorageBackend::Azure));
        assert_eq!(" Memory ".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("s3".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_storage_config_debug_redacts_connection_string() {
        let config = StorageConfig {
            backend: StorageBackend::Azure,
            connection_string: Some(SecretString::from(
                "AccountName=abc;AccountKey=c3VwZXJzZWNyZXQ=".to_string(),
            )),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("c3VwZXJzZWNyZXQ="));
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig::local_memory();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_is_https() {
        let mut config = AppConfig::local_memory();
        assert!(!config.is_https());
        config.base_url = "https://retail.example.com".to_string();
        assert!(config.is_https());
    }
}
