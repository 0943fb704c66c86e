//! Azure Storage REST backend.
//!
//! Talks to the Table, Blob, Queue and File REST APIs directly with
//! `reqwest`. Requests are signed with the account key (see [`auth`]).
//!
//! # Services
//!
//! - [`table`] - `TableService`, JSON with minimal metadata
//! - [`blob`] - `BlobService`, block blobs
//! - [`queue`] - `QueueService`, XML message envelopes
//! - [`file`] - `FileShareService`, create-then-put-range uploads

pub mod auth;
pub mod blob;
pub mod connection;
pub mod file;
pub mod queue;
pub mod table;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::instrument;
use url::Url;

use self::auth::{SharedKeyCredential, SignatureScheme, rfc1123_now};
pub use self::connection::StorageAccount;
use super::{Result, StorageError};

/// REST API version for blob, queue and file requests.
pub const STORAGE_API_VERSION: &str = "2021-12-02";
/// REST API version for table requests.
pub const TABLE_API_VERSION: &str = "2019-02-02";

/// Longest error body kept in a `StorageError::Service` message.
const MAX_ERROR_BODY: usize = 512;

/// Storage account client implementing all four storage services.
#[derive(Debug, Clone)]
pub struct AzureStorage {
    client: Client,
    account: StorageAccount,
    credential: SharedKeyCredential,
}

/// Which service a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Service {
    Blob,
    Queue,
    Table,
    File,
}

impl AzureStorage {
    /// Create a client from a connection string. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the connection string is invalid.
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        Self::new(StorageAccount::parse(connection_string)?)
    }

    /// Create a client for `account`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Config` if the key does not decode or the HTTP
    /// client cannot be built.
    pub fn new(account: StorageAccount) -> Result<Self> {
        let credential = SharedKeyCredential::new(account.name.clone(), account.key_bytes()?);
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StorageError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            account,
            credential,
        })
    }

    #[must_use]
    pub const fn account(&self) -> &StorageAccount {
        &self.account
    }

    fn endpoint(&self, service: Service) -> Result<&str> {
        match service {
            Service::Blob => Ok(&self.account.blob_endpoint),
            Service::Queue => Ok(&self.account.queue_endpoint),
            Service::Table => Ok(&self.account.table_endpoint),
            Service::File => self.account.file_endpoint.as_deref().ok_or_else(|| {
                StorageError::Config("no file service endpoint for this account".to_string())
            }),
        }
    }

    /// Absolute URL for `path` (already percent-encoded) on `service`.
    fn url(&self, service: Service, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{path}", self.endpoint(service)?))
            .map_err(|e| StorageError::Config(format!("invalid endpoint URL: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Stamp, sign and send a request.
    #[instrument(skip(self, builder), level = "debug")]
    async fn send(&self, service: Service, builder: RequestBuilder) -> Result<Response> {
        let (version, scheme) = match service {
            Service::Table => (TABLE_API_VERSION, SignatureScheme::SharedKeyLite),
            Service::Blob | Service::Queue | Service::File => {
                (STORAGE_API_VERSION, SignatureScheme::SharedKey)
            }
        };

        let mut request = builder
            .header("x-ms-date", rfc1123_now())
            .header("x-ms-version", version)
            .build()?;
        self.credential.sign(&mut request, scheme)?;

        tracing::debug!(method = %request.method(), url = %request.url(), "Storage request");
        Ok(self.client.execute(request).await?)
    }
}

/// Convert an unexpected response into `StorageError::Service`.
async fn service_error(response: Response) -> StorageError {
    let status = response.status();
    let code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("Unknown")
        .to_string();
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }

    tracing::warn!(status = status.as_u16(), code = %code, "Storage service error");
    StorageError::Service {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Pass `response` through when its status is one of `expected`.
async fn expect_status(response: Response, expected: &[StatusCode]) -> Result<Response> {
    if expected.contains(&response.status()) {
        Ok(response)
    } else {
        Err(service_error(response).await)
    }
}

/// Success for create calls, where `409 Conflict` means "already exists".
async fn expect_created(response: Response) -> Result<()> {
    match response.status() {
        s if s.is_success() || s == StatusCode::CONFLICT => Ok(()),
        _ => Err(service_error(response).await),
    }
}

/// Percent-encode each `/`-separated segment of a blob or file path.
fn encode_path(segments: &[&str]) -> String {
    segments
        .iter()
        .filter(|s| !s.is_empty())
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
