//! Queue message payloads.
//!
//! Messages are JSON objects with PascalCase field names. Consumers outside
//! this workspace read them, so field names are part of the wire contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Customer, CustomerId, Order, OrderId, OrderStatus, Price, Product, ProductId};

/// `UpdatedBy` value for changes made by the application itself.
pub const UPDATED_BY_SYSTEM: &str = "System";

/// Published to `order-notifications` when an order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderCreated {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: u32,
    pub total_price: Price,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl OrderCreated {
    #[must_use]
    pub fn new(order: &Order, customer: &Customer) -> Self {
        Self {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            customer_name: customer.full_name(),
            product_name: order.product_name.clone(),
            quantity: order.quantity,
            total_price: order.total_price,
            order_date: order.order_date,
            status: order.status.clone(),
        }
    }
}

/// Published to `order-notifications` when an operator changes a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderStatusChanged {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub product_name: String,
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub updated_by: String,
    pub updated_date: DateTime<Utc>,
}

impl OrderStatusChanged {
    /// Event for `order`, which already carries the new status.
    #[must_use]
    pub fn new(order: &Order, previous_status: OrderStatus, updated_date: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id.clone(),
            customer_id: order.customer_id.clone(),
            customer_name: order.username.clone(),
            product_name: order.product_name.clone(),
            previous_status,
            new_status: order.status.clone(),
            updated_by: UPDATED_BY_SYSTEM.to_owned(),
            updated_date,
        }
    }
}

/// Published to `stock-updates` whenever available stock changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StockUpdated {
    pub product_id: ProductId,
    pub product_name: String,
    pub previous_stock: u32,
    pub new_stock: u32,
    pub updated_by: String,
    pub update_date: DateTime<Utc>,
}

impl StockUpdated {
    /// Event for `product`, which already carries the new stock level.
    #[must_use]
    pub fn new(product: &Product, previous_stock: u32, update_date: DateTime<Utc>) -> Self {
        Self {
            product_id: product.id.clone(),
            product_name: product.product_name.clone(),
            previous_stock,
            new_stock: product.stock_available,
            updated_by: UPDATED_BY_SYSTEM.to_owned(),
            update_date,
        }
    }
}
