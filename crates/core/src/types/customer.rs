//! Customer record.

use serde::{Deserialize, Serialize};

use super::{CustomerId, Email, Record, RecordKind, VersionTag};

/// A customer of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    #[serde(rename = "RowKey")]
    pub id: CustomerId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: Email,
    pub shipping_address: String,
    #[serde(skip)]
    pub version: Option<VersionTag>,
}

impl Customer {
    /// A new, unsaved customer with a fresh row ID.
    #[must_use]
    pub fn new(
        name: String,
        surname: String,
        username: String,
        email: Email,
        shipping_address: String,
    ) -> Self {
        Self {
            id: CustomerId::generate(),
            name,
            surname,
            username,
            email,
            shipping_address,
            version: None,
        }
    }

    /// Name and surname separated by a space.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.surname).trim().to_owned()
    }
}

impl Record for Customer {
    const KIND: RecordKind = RecordKind::Customer;

    fn row_key(&self) -> &str {
        self.id.as_str()
    }

    fn version(&self) -> Option<&VersionTag> {
        self.version.as_ref()
    }

    fn set_version(&mut self, version: Option<VersionTag>) {
        self.version = version;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer::new(
            "Thandi".to_owned(),
            "Mokoena".to_owned(),
            "thandim".to_owned(),
            Email::parse("thandi@example.com").unwrap(),
            "12 Long Street, Cape Town".to_owned(),
        )
    }

    #[test]
    fn test_serializes_with_table_property_names() {
        let c = customer();
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["RowKey"], c.id.as_str());
        assert_eq!(json["Name"], "Thandi");
        assert_eq!(json["ShippingAddress"], "12 Long Street, Cape Town");
        assert!(json.get("Version").is_none());
    }

    #[test]
    fn test_ignores_system_properties() {
        let json = serde_json::json!({
            "PartitionKey": "Customer",
            "RowKey": "c-1",
            "Timestamp": "2024-01-01T00:00:00Z",
            "Name": "A",
            "Surname": "B",
            "Username": "ab",
            "Email": "a@b.co",
            "ShippingAddress": "x",
        });
        let c: Customer = serde_json::from_value(json).unwrap();
        assert_eq!(c.id.as_str(), "c-1");
        assert!(c.version.is_none());
    }

    #[test]
    fn test_key_uses_customer_partition() {
        let c = customer();
        assert_eq!(c.key().partition_key, "Customer");
        assert_eq!(c.key().row_key, c.id.as_str());
    }

    #[test]
    fn test_full_name() {
        assert_eq!(customer().full_name(), "Thandi Mokoena");
    }
}
