//! Order route handlers.
//!
//! This module contains handlers for order listing, detail views, placement,
//! editing and the JSON status endpoint.

mod create;
mod detail;
mod edit;
mod list;
mod status;
pub mod types;

pub use types::{OrderCreateForm, OrderEditForm, StatusResponse, StatusUpdateInput, parse_order_date};

pub use list::{OrdersIndexTemplate, index};

pub use detail::{OrderShowTemplate, show};

pub use create::{OrderCreateTemplate, create, new_form};

pub use edit::{OrderEditTemplate, delete, edit_form, update};

pub use status::update_status;
