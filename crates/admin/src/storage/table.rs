//! Wide-column table service primitives.
//!
//! Rows are JSON property maps that include `PartitionKey` and `RowKey`.
//! Typed access lives in [`super::EntityStore`].

use abc_retailers_core::{RecordKey, VersionTag};
use async_trait::async_trait;

use super::Result;

/// Property map of a table row.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// A row read from a table, with its current version tag.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub properties: Properties,
    pub etag: VersionTag,
}

/// Position to resume a query from, returned by the service when a result
/// set spans several pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    pub next_partition_key: String,
    pub next_row_key: Option<String>,
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct TablePage {
    pub rows: Vec<TableRow>,
    pub continuation: Option<Continuation>,
}

#[async_trait]
pub trait TableService: Send + Sync {
    /// Create `table`; succeeds if it already exists.
    async fn create_table(&self, table: &str) -> Result<()>;

    /// Read one page of every row in `table`.
    async fn query(&self, table: &str, continuation: Option<&Continuation>) -> Result<TablePage>;

    /// Point lookup; `None` when the row does not exist.
    async fn get(&self, table: &str, key: &RecordKey) -> Result<Option<TableRow>>;

    /// Insert a new row. Fails with `AlreadyExists` on a duplicate key.
    async fn insert(&self, table: &str, properties: Properties) -> Result<VersionTag>;

    /// Replace a row if its tag still matches `if_match`.
    ///
    /// Fails with `ConcurrencyConflict` when the tag differs or the row is
    /// gone.
    async fn replace(
        &self,
        table: &str,
        key: &RecordKey,
        properties: Properties,
        if_match: &VersionTag,
    ) -> Result<VersionTag>;

    /// Delete a row unconditionally; succeeds if it does not exist.
    async fn delete(&self, table: &str, key: &RecordKey) -> Result<()>;
}
