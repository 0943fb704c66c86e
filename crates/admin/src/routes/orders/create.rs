//! Order placement handlers.

use abc_retailers_core::{Customer, Product};
use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    filters,
    middleware::{Flash, push_flash},
    routes::{failure_message, render},
    services::{OrderError, PlaceOrder},
    state::AppState,
};

use super::types::OrderCreateForm;

/// Order placement form template.
#[derive(Template)]
#[template(path = "orders/new.html")]
pub struct OrderCreateTemplate {
    pub current_path: String,
    pub flashes: Vec<Flash>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub form: OrderCreateForm,
    pub error: Option<String>,
}

/// Render the placement form with fresh customer and product lists.
async fn form_page(state: &AppState, form: OrderCreateForm, error: Option<String>) -> Html<String> {
    let entities = state.storage().entities();
    let (customers, products) = tokio::join!(entities.list::<Customer>(), entities.list::<Product>());

    render(&OrderCreateTemplate {
        current_path: "/orders".to_string(),
        flashes: Vec::new(),
        customers: customers.unwrap_or_else(|e| {
            tracing::error!("Failed to fetch customers: {e}");
            Vec::new()
        }),
        products: products.unwrap_or_else(|e| {
            tracing::error!("Failed to fetch products: {e}");
            Vec::new()
        }),
        form,
        error,
    })
}

/// New order form handler.
#[instrument(skip(state))]
pub async fn new_form(State(state): State<AppState>) -> Html<String> {
    form_page(&state, OrderCreateForm::today(), None).await
}

/// Place order handler.
#[instrument(skip(state, session, form))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OrderCreateForm>,
) -> Response {
    let (quantity, order_date) = match form.validate() {
        Ok(valid) => valid,
        Err(message) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                form_page(&state, form, Some(message)).await,
            )
                .into_response();
        }
    };

    let request = PlaceOrder {
        customer_id: form.customer_id.trim().to_string(),
        product_id: form.product_id.trim().to_string(),
        quantity,
        order_date,
    };

    match state.orders().place_order(request).await {
        Ok(order) => {
            let message = format!(
                "Order for product '{}' created successfully.",
                order.product_name
            );
            push_flash(&session, Flash::success(message)).await;
            Redirect::to("/orders").into_response()
        }
        Err(OrderError::Storage(e)) => {
            let message = failure_message("An error occurred while creating the order", &e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                form_page(&state, form, Some(message)).await,
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            form_page(&state, form, Some(e.to_string())).await,
        )
            .into_response(),
    }
}
