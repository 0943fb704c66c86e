//! Keyed records and their storage metadata.
//!
//! Every record stored in table storage has a two-part identity (partition
//! key and row key) and a version tag assigned by the store on each write.
//! The partition key and table name are static metadata of the record's
//! [`RecordKind`]; nothing is discovered through runtime type inspection.

use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// The kind of a stored record.
///
/// Each kind maps to exactly one table and one partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Customer,
    Product,
    Order,
    /// Extension point for kinds without a dedicated table mapping.
    ///
    /// The table name is the kind name with an `s` appended.
    Other(&'static str),
}

impl RecordKind {
    /// The kinds provisioned at startup.
    pub const PROVISIONED: [Self; 3] = [Self::Customer, Self::Product, Self::Order];

    /// Name of the kind, also used as the partition key.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Product => "Product",
            Self::Order => "Order",
            Self::Other(name) => name,
        }
    }

    /// Partition key shared by every record of this kind.
    #[must_use]
    pub const fn partition_key(self) -> &'static str {
        self.name()
    }

    /// Table holding records of this kind.
    #[must_use]
    pub fn table_name(self) -> String {
        match self {
            Self::Customer => "Customers".to_owned(),
            Self::Product => "Products".to_owned(),
            Self::Order => "Orders".to_owned(),
            Self::Other(name) => format!("{name}s"),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque version tag (`ETag`) assigned by the store on every write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    /// Wrap a tag returned by the store.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw tag value, suitable for an `If-Match` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two-part identity of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub partition_key: String,
    pub row_key: String,
}

impl RecordKey {
    #[must_use]
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition_key, self.row_key)
    }
}

/// A record that can be stored in table storage.
///
/// The serialized form must carry the row key under `RowKey`; the store adds
/// `PartitionKey` from [`Record::KIND`]. The version tag is not part of the
/// serialized form.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The kind this record belongs to.
    const KIND: RecordKind;

    /// Row key of this record.
    fn row_key(&self) -> &str;

    /// Version tag from the last read or write, if any.
    fn version(&self) -> Option<&VersionTag>;

    /// Replace the version tag after a successful write.
    fn set_version(&mut self, version: Option<VersionTag>);

    /// Full identity of this record.
    fn key(&self) -> RecordKey {
        RecordKey::new(Self::KIND.partition_key(), self.row_key())
    }
}
