//! Core types for ABC Retailers.
//!
//! This module provides the keyed records stored in table storage and the
//! value types they are built from.

pub mod customer;
pub mod email;
pub mod id;
pub mod messages;
pub mod naming;
pub mod order;
pub mod price;
pub mod product;
pub mod record;
pub mod status;

pub use customer::Customer;
pub use email::{Email, EmailError};
pub use id::*;
pub use messages::{OrderCreated, OrderStatusChanged, StockUpdated, UPDATED_BY_SYSTEM};
pub use naming::{ObjectNaming, Visibility};
pub use order::Order;
pub use price::{Price, PriceError};
pub use product::Product;
pub use record::{Record, RecordKey, RecordKind, VersionTag};
pub use status::OrderStatus;
