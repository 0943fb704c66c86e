//! Business logic services.
//!
//! # Services
//!
//! - `ordering` - Order placement and status changes with queue events

pub mod ordering;

pub use ordering::{OrderError, OrderService, PlaceOrder, StatusChange};
