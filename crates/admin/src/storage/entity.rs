//! Typed keyed-record repository over the table service.

use std::sync::Arc;

use abc_retailers_core::{Record, RecordKey, RecordKind};
use serde_json::Value;
use tracing::instrument;

use super::table::{Properties, TableRow, TableService};
use super::{Result, StorageError};

const PARTITION_KEY: &str = "PartitionKey";
const ROW_KEY: &str = "RowKey";

/// Repository for keyed records.
///
/// The table and partition of a record come from [`Record::KIND`]. Every
/// successful write returns the record carrying its new version tag; updates
/// require the tag the record was read with.
#[derive(Clone)]
pub struct EntityStore {
    tables: Arc<dyn TableService>,
}

impl EntityStore {
    #[must_use]
    pub fn new(tables: Arc<dyn TableService>) -> Self {
        Self { tables }
    }

    /// Create the table for `kind` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the table service rejects the request.
    pub async fn ensure_table(&self, kind: RecordKind) -> Result<()> {
        self.tables.create_table(&kind.table_name()).await
    }

    /// Every record of kind `T`, in store order.
    ///
    /// Continuation tokens are followed until the table is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if a page cannot be read or a row does not decode.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn list<T: Record>(&self) -> Result<Vec<T>> {
        let table = T::KIND.table_name();
        let mut records = Vec::new();
        let mut continuation = None;

        loop {
            let page = self.tables.query(&table, continuation.as_ref()).await?;
            for row in page.rows {
                records.push(decode::<T>(row)?);
            }
            match page.continuation {
                Some(next) => continuation = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    /// Point lookup by full identity. A missing record is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails or the row does not decode.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn get<T: Record>(&self, partition_key: &str, row_key: &str) -> Result<Option<T>> {
        let key = RecordKey::new(partition_key, row_key);
        self.tables
            .get(&T::KIND.table_name(), &key)
            .await?
            .map(decode::<T>)
            .transpose()
    }

    /// Point lookup within the kind's own partition.
    ///
    /// # Errors
    ///
    /// See [`EntityStore::get`].
    pub async fn find<T: Record>(&self, row_key: &str) -> Result<Option<T>> {
        self.get::<T>(T::KIND.partition_key(), row_key).await
    }

    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the identity is taken.
    #[instrument(skip(self, record), fields(kind = %T::KIND, row_key = %record.row_key()))]
    pub async fn insert<T: Record>(&self, mut record: T) -> Result<T> {
        let properties = encode(&record)?;
        let etag = self.tables.insert(&T::KIND.table_name(), properties).await?;
        record.set_version(Some(etag));
        Ok(record)
    }

    /// Replace a record, conditional on the tag it was read with.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConcurrencyConflict` if the stored record has
    /// changed or been deleted since it was read, and
    /// `StorageError::InvalidRecord` if `record` carries no tag.
    #[instrument(skip(self, record), fields(kind = %T::KIND, row_key = %record.row_key()))]
    pub async fn update<T: Record>(&self, mut record: T) -> Result<T> {
        let if_match = record.version().cloned().ok_or_else(|| {
            StorageError::InvalidRecord(format!(
                "{} {} has no version tag; read it before updating",
                T::KIND,
                record.row_key()
            ))
        })?;
        let properties = encode(&record)?;
        let etag = self
            .tables
            .replace(&T::KIND.table_name(), &record.key(), properties, &if_match)
            .await?;
        record.set_version(Some(etag));
        Ok(record)
    }

    /// Delete a record. Deleting a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the table service rejects the request.
    #[instrument(skip(self), fields(kind = %T::KIND))]
    pub async fn delete<T: Record>(&self, partition_key: &str, row_key: &str) -> Result<()> {
        let key = RecordKey::new(partition_key, row_key);
        self.tables.delete(&T::KIND.table_name(), &key).await
    }
}

fn encode<T: Record>(record: &T) -> Result<Properties> {
    let Value::Object(mut properties) = serde_json::to_value(record)? else {
        return Err(StorageError::InvalidRecord(format!(
            "{} does not serialize to an object",
            T::KIND
        )));
    };
    properties.insert(
        PARTITION_KEY.to_string(),
        Value::String(T::KIND.partition_key().to_string()),
    );
    if !properties.get(ROW_KEY).is_some_and(Value::is_string) {
        return Err(StorageError::InvalidRecord(format!(
            "{} does not serialize a RowKey",
            T::KIND
        )));
    }
    Ok(properties)
}

fn decode<T: Record>(row: TableRow) -> Result<T> {
    let row_key = row
        .properties
        .get(ROW_KEY)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let mut record: T = serde_json::from_value(Value::Object(row.properties))
        .map_err(|e| StorageError::InvalidRecord(format!("{} {row_key}: {e}", T::KIND)))?;
    record.set_version(Some(row.etag));
    Ok(record)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use abc_retailers_core::{Customer, Email, Price, Product};

    use super::*;
    use crate::storage::MemoryStorage;

    async fn store_with(memory: MemoryStorage) -> EntityStore {
        let store = EntityStore::new(Arc::new(memory));
        for kind in RecordKind::PROVISIONED {
            store.ensure_table(kind).await.unwrap();
        }
        store
    }

    async fn store() -> EntityStore {
        store_with(MemoryStorage::new()).await
    }

    fn customer(username: &str) -> Customer {
        Customer::new(
            "Ayanda".to_string(),
            "Zulu".to_string(),
            username.to_string(),
            Email::parse("ayanda@example.com").unwrap(),
            "7 Beach Rd, Durban".to_string(),
        )
    }

    #[tokio::test]
    async fn test_insert_then_get_returns_record_with_tag() {
        let store = store().await;
        let inserted = store.insert(customer("ayanda")).await.unwrap();
        assert!(inserted.version.is_some());

        let fetched: Customer = store
            .get("Customer", inserted.id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, inserted);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = store().await;
        let missing = store.find::<Customer>("nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_identity_fails() {
        let store = store().await;
        let first = store.insert(customer("a")).await.unwrap();
        let mut duplicate = customer("b");
        duplicate.id = first.id.clone();

        let err = store.insert(duplicate).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists));
    }

    #[tokio::test]
    async fn test_update_changes_tag() {
        let store = store().await;
        let mut record = store.insert(customer("a")).await.unwrap();
        let first_tag = record.version.clone();
        record.shipping_address = "9 Hill St".to_string();

        let updated = store.update(record).await.unwrap();
        assert_ne!(updated.version, first_tag);

        let fetched = store.find::<Customer>(updated.id.as_str()).await.unwrap().unwrap();
        assert_eq!(fetched.shipping_address, "9 Hill St");
    }

    #[tokio::test]
    async fn test_update_with_stale_tag_conflicts_and_keeps_stored_record() {
        let store = store().await;
        let inserted = store.insert(customer("a")).await.unwrap();

        let mut first_read = store.find::<Customer>(inserted.id.as_str()).await.unwrap().unwrap();
        let mut second_read = first_read.clone();

        first_read.name = "First".to_string();
        store.update(first_read).await.unwrap();

        second_read.name = "Second".to_string();
        let err = store.update(second_read).await.unwrap_err();
        assert!(matches!(err, StorageError::ConcurrencyConflict));

        let stored = store.find::<Customer>(inserted.id.as_str()).await.unwrap().unwrap();
        assert_eq!(stored.name, "First");
    }

    #[tokio::test]
    async fn test_update_after_delete_conflicts() {
        let store = store().await;
        let inserted = store.insert(customer("a")).await.unwrap();
        store
            .delete::<Customer>("Customer", inserted.id.as_str())
            .await
            .unwrap();

        let err = store.update(inserted).await.unwrap_err();
        assert!(matches!(err, StorageError::ConcurrencyConflict));
    }

    #[tokio::test]
    async fn test_update_without_tag_is_rejected() {
        let store = store().await;
        let err = store.update(customer("a")).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_succeeds() {
        let store = store().await;
        store.delete::<Customer>("Customer", "never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_drains_every_page() {
        let store = store_with(MemoryStorage::with_page_size(2)).await;
        for i in 0..5 {
            store
                .insert(Product::new(
                    format!("Product {i}"),
                    String::new(),
                    Price::parse_lenient("1.00").unwrap(),
                    i,
                ))
                .await
                .unwrap();
        }

        let products = store.list::<Product>().await.unwrap();
        assert_eq!(products.len(), 5);
        assert!(products.iter().all(|p| p.version.is_some()));
    }

    #[tokio::test]
    async fn test_list_only_returns_own_kind() {
        let store = store().await;
        store.insert(customer("a")).await.unwrap();
        store.insert(customer("b")).await.unwrap();

        assert_eq!(store.list::<Customer>().await.unwrap().len(), 2);
        assert!(store.list::<Product>().await.unwrap().is_empty());
    }

    #[test]
    fn test_encode_adds_partition_key() {
        let c = customer("a");
        let properties = encode(&c).unwrap();
        assert_eq!(properties["PartitionKey"], "Customer");
        assert_eq!(properties["RowKey"], c.id.as_str());
    }
}
