//! In-memory storage backend.
//!
//! Implements all four storage services over process-local maps with the
//! same observable rules as the cloud services: unique inserts, tag-checked
//! replaces, idempotent deletes, FIFO queues and paged table queries.
//! Everything is lost when the process exits.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use abc_retailers_core::{RecordKey, VersionTag, Visibility};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::blob::BlobService;
use super::file_share::FileShareService;
use super::queue::{QueueMessage, QueueService};
use super::table::{Continuation, Properties, TablePage, TableRow, TableService};
use super::{Result, StorageError};

/// Base of the URLs returned for in-memory blobs.
pub const MEMORY_BLOB_ENDPOINT: &str = "memory://devstore";

/// Rows per query page, matching the table service's own limit.
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredRow {
    properties: Properties,
    etag: VersionTag,
}

#[derive(Debug, Default)]
struct Container {
    visibility: Option<Visibility>,
    blobs: HashMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Queue {
    visible: VecDeque<String>,
    in_flight: HashMap<String, (String, String)>,
}

#[derive(Debug, Default)]
struct Share {
    directories: HashSet<String>,
    files: HashMap<(String, String), Vec<u8>>,
}

/// Process-local implementation of the table, blob, queue and file services.
#[derive(Debug)]
pub struct MemoryStorage {
    page_size: usize,
    sequence: AtomicU64,
    tables: RwLock<HashMap<String, BTreeMap<RecordKey, StoredRow>>>,
    containers: RwLock<HashMap<String, Container>>,
    queues: RwLock<HashMap<String, Queue>>,
    shares: RwLock<HashMap<String, Share>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Storage whose table queries return at most `page_size` rows per page.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            sequence: AtomicU64::new(1),
            tables: RwLock::default(),
            containers: RwLock::default(),
            queues: RwLock::default(),
            shares: RwLock::default(),
        }
    }

    /// Content of a stored blob.
    pub async fn blob(&self, container: &str, name: &str) -> Option<Vec<u8>> {
        self.containers
            .read()
            .await
            .get(container)
            .and_then(|c| c.blobs.get(name).cloned())
    }

    /// Visibility a container was created with.
    pub async fn container_visibility(&self, container: &str) -> Option<Visibility> {
        self.containers
            .read()
            .await
            .get(container)
            .and_then(|c| c.visibility)
    }

    /// Number of visible messages in a queue.
    pub async fn queue_len(&self, queue: &str) -> usize {
        self.queues
            .read()
            .await
            .get(queue)
            .map_or(0, |q| q.visible.len())
    }

    fn next_etag(&self) -> VersionTag {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        VersionTag::new(format!("W/\"{n}\""))
    }

    fn next_id(&self) -> String {
        self.sequence.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

fn not_found(code: &str, what: &str) -> StorageError {
    StorageError::Service {
        status: 404,
        code: code.to_string(),
        message: format!("{what} does not exist"),
    }
}

fn row_key_of(properties: &Properties) -> Result<RecordKey> {
    let field = |name: &str| {
        properties
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StorageError::Service {
                status: 400,
                code: "PropertiesNeedValue".to_string(),
                message: format!("{name} is required"),
            })
    };
    Ok(RecordKey::new(field("PartitionKey")?, field("RowKey")?))
}

#[async_trait]
impl TableService for MemoryStorage {
    async fn create_table(&self, table: &str) -> Result<()> {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default();
        Ok(())
    }

    async fn query(&self, table: &str, continuation: Option<&Continuation>) -> Result<TablePage> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(table)
            .ok_or_else(|| not_found("TableNotFound", table))?;

        let start = continuation.map(|c| {
            RecordKey::new(
                c.next_partition_key.clone(),
                c.next_row_key.clone().unwrap_or_default(),
            )
        });
        let mut remaining = rows
            .iter()
            .filter(|(key, _)| start.as_ref().is_none_or(|start| *key >= start));

        let page: Vec<TableRow> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(_, row)| TableRow {
                properties: row.properties.clone(),
                etag: row.etag.clone(),
            })
            .collect();
        let continuation = remaining.next().map(|(key, _)| Continuation {
            next_partition_key: key.partition_key.clone(),
            next_row_key: Some(key.row_key.clone()),
        });

        Ok(TablePage {
            rows: page,
            continuation,
        })
    }

    async fn get(&self, table: &str, key: &RecordKey) -> Result<Option<TableRow>> {
        Ok(self
            .tables
            .read()
            .await
            .get(table)
            .and_then(|rows| rows.get(key))
            .map(|row| TableRow {
                properties: row.properties.clone(),
                etag: row.etag.clone(),
            }))
    }

    async fn insert(&self, table: &str, properties: Properties) -> Result<VersionTag> {
        let key = row_key_of(&properties)?;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| not_found("TableNotFound", table))?;
        if rows.contains_key(&key) {
            return Err(StorageError::AlreadyExists);
        }

        let etag = self.next_etag();
        rows.insert(
            key,
            StoredRow {
                properties,
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    async fn replace(
        &self,
        table: &str,
        key: &RecordKey,
        properties: Properties,
        if_match: &VersionTag,
    ) -> Result<VersionTag> {
        let mut tables = self.tables.write().await;
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(key))
            .ok_or(StorageError::ConcurrencyConflict)?;
        if row.etag != *if_match {
            return Err(StorageError::ConcurrencyConflict);
        }

        let etag = self.next_etag();
        row.properties = properties;
        row.etag = etag.clone();
        Ok(etag)
    }

    async fn delete(&self, table: &str, key: &RecordKey) -> Result<()> {
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            rows.remove(key);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobService for MemoryStorage {
    async fn create_container(&self, container: &str, visibility: Visibility) -> Result<()> {
        let mut containers = self.containers.write().await;
        let entry = containers.entry(container.to_string()).or_default();
        entry.visibility.get_or_insert(visibility);
        Ok(())
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        content: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        self.containers
            .write()
            .await
            .get_mut(container)
            .ok_or_else(|| not_found("ContainerNotFound", container))?
            .blobs
            .insert(name.to_string(), content);
        Ok(())
    }

    async fn delete_blob(&self, container: &str, name: &str) -> Result<()> {
        if let Some(c) = self.containers.write().await.get_mut(container) {
            c.blobs.remove(name);
        }
        Ok(())
    }

    fn blob_url(&self, container: &str, name: &str) -> String {
        format!(
            "{MEMORY_BLOB_ENDPOINT}/{container}/{}",
            urlencoding::encode(name)
        )
    }
}

#[async_trait]
impl QueueService for MemoryStorage {
    async fn create_queue(&self, queue: &str) -> Result<()> {
        self.queues
            .write()
            .await
            .entry(queue.to_string())
            .or_default();
        Ok(())
    }

    async fn put_message(&self, queue: &str, text: &str) -> Result<()> {
        self.queues
            .write()
            .await
            .get_mut(queue)
            .ok_or_else(|| not_found("QueueNotFound", queue))?
            .visible
            .push_back(text.to_string());
        Ok(())
    }

    async fn get_message(&self, queue: &str) -> Result<Option<QueueMessage>> {
        let mut queues = self.queues.write().await;
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| not_found("QueueNotFound", queue))?;
        let Some(text) = queue_state.visible.pop_front() else {
            return Ok(None);
        };

        let message = QueueMessage {
            id: self.next_id(),
            pop_receipt: self.next_id(),
            text,
        };
        queue_state.in_flight.insert(
            message.id.clone(),
            (message.pop_receipt.clone(), message.text.clone()),
        );
        Ok(Some(message))
    }

    async fn delete_message(&self, queue: &str, message: &QueueMessage) -> Result<()> {
        let mut queues = self.queues.write().await;
        let queue_state = queues
            .get_mut(queue)
            .ok_or_else(|| not_found("QueueNotFound", queue))?;
        match queue_state.in_flight.get(&message.id) {
            Some((receipt, _)) if *receipt == message.pop_receipt => {
                queue_state.in_flight.remove(&message.id);
                Ok(())
            }
            _ => Err(not_found("MessageNotFound", &message.id)),
        }
    }
}

#[async_trait]
impl FileShareService for MemoryStorage {
    async fn create_share(&self, share: &str) -> Result<()> {
        self.shares
            .write()
            .await
            .entry(share.to_string())
            .or_default();
        Ok(())
    }

    async fn create_directory(&self, share: &str, directory: &str) -> Result<()> {
        self.shares
            .write()
            .await
            .get_mut(share)
            .ok_or_else(|| not_found("ShareNotFound", share))?
            .directories
            .insert(directory.to_string());
        Ok(())
    }

    async fn create_file(&self, share: &str, directory: &str, name: &str, length: u64) -> Result<()> {
        let length = usize::try_from(length)
            .map_err(|_| StorageError::InvalidRecord(format!("file length {length} too large")))?;
        let mut shares = self.shares.write().await;
        let share_state = shares
            .get_mut(share)
            .ok_or_else(|| not_found("ShareNotFound", share))?;
        if !directory.is_empty() && !share_state.directories.contains(directory) {
            return Err(not_found("ParentNotFound", directory));
        }
        share_state
            .files
            .insert((directory.to_string(), name.to_string()), vec![0; length]);
        Ok(())
    }

    async fn put_range(
        &self,
        share: &str,
        directory: &str,
        name: &str,
        offset: u64,
        content: &[u8],
    ) -> Result<()> {
        let mut shares = self.shares.write().await;
        let file = shares
            .get_mut(share)
            .and_then(|s| s.files.get_mut(&(directory.to_string(), name.to_string())))
            .ok_or_else(|| not_found("ResourceNotFound", name))?;

        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        let end = start.saturating_add(content.len());
        let target = file.get_mut(start..end).ok_or_else(|| StorageError::Service {
            status: 416,
            code: "InvalidRange".to_string(),
            message: format!("range {start}-{end} is outside the file"),
        })?;
        target.copy_from_slice(content);
        Ok(())
    }

    async fn get_file(&self, share: &str, directory: &str, name: &str) -> Result<Vec<u8>> {
        self.shares
            .read()
            .await
            .get(share)
            .and_then(|s| s.files.get(&(directory.to_string(), name.to_string())))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(pk: &str, rk: &str) -> Properties {
        let Value::Object(map) = json!({"PartitionKey": pk, "RowKey": rk, "Name": rk}) else {
            unreachable!()
        };
        map
    }

    #[tokio::test]
    async fn test_query_pages_in_key_order() {
        let storage = MemoryStorage::with_page_size(2);
        storage.create_table("Things").await.unwrap();
        for rk in ["c", "a", "b"] {
            storage.insert("Things", row("Thing", rk)).await.unwrap();
        }

        let first = storage.query("Things", None).await.unwrap();
        assert_eq!(first.rows.len(), 2);
        assert_eq!(first.rows[0].properties["RowKey"], "a");
        let next = first.continuation.unwrap();
        assert_eq!(next.next_row_key.as_deref(), Some("c"));

        let second = storage.query("Things", Some(&next)).await.unwrap();
        assert_eq!(second.rows.len(), 1);
        assert!(second.continuation.is_none());
    }

    #[tokio::test]
    async fn test_insert_into_missing_table_fails() {
        let storage = MemoryStorage::new();
        let err = storage.insert("Nope", row("P", "r")).await.unwrap_err();
        assert!(matches!(err, StorageError::Service { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_insert_requires_keys() {
        let storage = MemoryStorage::new();
        storage.create_table("Things").await.unwrap();
        let err = storage
            .insert("Things", serde_json::Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Service { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_container_visibility_is_fixed_at_creation() {
        let storage = MemoryStorage::new();
        storage
            .create_container("c", Visibility::Private)
            .await
            .unwrap();
        storage
            .create_container("c", Visibility::PublicRead)
            .await
            .unwrap();
        assert_eq!(
            storage.container_visibility("c").await,
            Some(Visibility::Private)
        );
    }

    #[tokio::test]
    async fn test_delete_message_needs_matching_receipt() {
        let storage = MemoryStorage::new();
        storage.create_queue("q").await.unwrap();
        storage.put_message("q", "hello").await.unwrap();

        let mut message = storage.get_message("q").await.unwrap().unwrap();
        let receipt = message.pop_receipt.clone();
        message.pop_receipt = "stale".to_string();
        assert!(storage.delete_message("q", &message).await.is_err());

        message.pop_receipt = receipt;
        storage.delete_message("q", &message).await.unwrap();
        assert_eq!(storage.queue_len("q").await, 0);
    }

    #[tokio::test]
    async fn test_create_file_needs_directory() {
        let storage = MemoryStorage::new();
        storage.create_share("s").await.unwrap();
        assert!(storage.create_file("s", "missing", "f", 1).await.is_err());
        storage.create_file("s", "", "f", 1).await.unwrap();
    }
}
