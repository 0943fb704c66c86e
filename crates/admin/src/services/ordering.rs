//! Order placement and status changes.
//!
//! Placing an order touches the table service twice and the queue service
//! twice. Stock is reserved before the order is written, so losing a race on
//! the product never leaves an order behind. The steps are not compensated:
//! if a later step fails, earlier writes stay in place.

use abc_retailers_core::{
    Customer, Order, OrderCreated, OrderStatus, OrderStatusChanged, Product, StockUpdated,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::instrument;

use crate::storage::{
    ORDER_NOTIFICATIONS_QUEUE, STOCK_UPDATES_QUEUE, StorageError, StorageServices,
};

/// Tag-checked stock updates tried before giving up on a contended product.
const STOCK_UPDATE_ATTEMPTS: usize = 3;

/// Errors that can occur while placing or changing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Selected customer or product does not exist.")]
    CustomerOrProductMissing,

    #[error("Quantity must be at least 1.")]
    InvalidQuantity,

    #[error("Insufficient stock for product '{product_name}'. Available stock: {available}.")]
    InsufficientStock { product_name: String, available: u32 },

    #[error("Order not found.")]
    OrderNotFound,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A request to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub order_date: DateTime<Utc>,
}

/// Result of a status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub order: Order,
    pub previous_status: OrderStatus,
}

/// Order workflows over the storage adapters.
#[derive(Clone)]
pub struct OrderService {
    storage: StorageServices,
}

impl OrderService {
    #[must_use]
    pub const fn new(storage: StorageServices) -> Self {
        Self { storage }
    }

    /// Place an order and publish its events.
    ///
    /// Steps, in order: read customer and product, reserve stock with a
    /// tag-checked update (re-reading and re-checking the product when
    /// another writer got there first), insert the order as `Submitted`
    /// priced at the product's current price, publish `OrderCreated` to
    /// `order-notifications`, publish `StockUpdated` to `stock-updates`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any write if the customer or
    /// product is missing, the quantity is zero, or stock is short. Returns
    /// `StorageError::ConcurrencyConflict` with nothing written if the
    /// product keeps changing for every attempt.
    #[instrument(skip(self), fields(customer_id = %request.customer_id, product_id = %request.product_id))]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, OrderError> {
        if request.quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }

        let entities = self.storage.entities();
        let (customer, product) = tokio::try_join!(
            entities.find::<Customer>(&request.customer_id),
            entities.find::<Product>(&request.product_id),
        )?;
        let (Some(customer), Some(product)) = (customer, product) else {
            return Err(OrderError::CustomerOrProductMissing);
        };

        let (product, previous_stock) = self.reserve_stock(product, request.quantity).await?;

        let order = entities
            .insert(Order::place(&customer, &product, request.quantity, request.order_date))
            .await?;

        let queues = self.storage.queues();
        queues
            .send_json(ORDER_NOTIFICATIONS_QUEUE, &OrderCreated::new(&order, &customer))
            .await?;
        queues
            .send_json(
                STOCK_UPDATES_QUEUE,
                &StockUpdated::new(&product, previous_stock, Utc::now()),
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            quantity = order.quantity,
            total = %order.total_price,
            "Order placed"
        );
        Ok(order)
    }

    /// Decrement the product's stock by `quantity`. Returns the updated
    /// product and the stock it had before.
    async fn reserve_stock(
        &self,
        mut product: Product,
        quantity: u32,
    ) -> Result<(Product, u32), OrderError> {
        let entities = self.storage.entities();
        let mut attempt = 1;
        loop {
            if !product.has_stock_for(quantity) {
                return Err(OrderError::InsufficientStock {
                    product_name: product.product_name,
                    available: product.stock_available,
                });
            }

            let previous_stock = product.stock_available;
            let mut reserved = product.clone();
            reserved.stock_available -= quantity;

            match entities.update(reserved).await {
                Ok(updated) => return Ok((updated, previous_stock)),
                Err(StorageError::ConcurrencyConflict) if attempt < STOCK_UPDATE_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        product_id = %product.id,
                        "Product changed while placing order, retrying"
                    );
                    attempt += 1;
                    product = entities
                        .find::<Product>(product.id.as_str())
                        .await?
                        .ok_or(OrderError::CustomerOrProductMissing)?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Change an order's status and publish `OrderStatusChanged`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if the order does not exist, or a
    /// storage error if the update or publish fails.
    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> Result<StatusChange, OrderError> {
        let entities = self.storage.entities();
        let mut order = entities
            .find::<Order>(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let previous_status = std::mem::replace(&mut order.status, new_status);
        let order = entities.update(order).await?;

        self.storage
            .queues()
            .send_json(
                ORDER_NOTIFICATIONS_QUEUE,
                &OrderStatusChanged::new(&order, previous_status.clone(), Utc::now()),
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            previous = %previous_status,
            new = %order.status,
            "Order status changed"
        );
        Ok(StatusChange {
            order,
            previous_status,
        })
    }
}
