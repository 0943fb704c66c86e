//! Order record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Customer, CustomerId, OrderId, OrderStatus, Price, Product, ProductId, Record, RecordKind, VersionTag};

/// An order for a single product.
///
/// `username` and `product_name` are a snapshot taken when the order is
/// placed and are not kept in sync with later edits to the customer or
/// product. `total_price` is computed once at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    #[serde(rename = "RowKey")]
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub username: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub order_date: DateTime<Utc>,
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
    pub status: OrderStatus,
    #[serde(skip)]
    pub version: Option<VersionTag>,
}

impl Order {
    /// A new `Submitted` order priced from the product's current price.
    #[must_use]
    pub fn place(customer: &Customer, product: &Product, quantity: u32, order_date: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::generate(),
            customer_id: customer.id.clone(),
            username: customer.username.clone(),
            product_id: product.id.clone(),
            product_name: product.product_name.clone(),
            order_date,
            quantity,
            unit_price: product.price,
            total_price: product.price.times(quantity),
            status: OrderStatus::Submitted,
            version: None,
        }
    }
}

impl Record for Order {
    const KIND: RecordKind = RecordKind::Order;

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
