//! JSON API handlers used by page scripts.

use abc_retailers_core::{Price, Product};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::state::AppState;

/// Price lookup reply. Only `success` is set when the product is missing
/// or the lookup fails.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPriceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

impl From<Product> for ProductPriceResponse {
    fn from(product: Product) -> Self {
        Self {
            success: true,
            price: Some(product.price),
            stock: Some(product.stock_available),
            product_name: Some(product.product_name),
        }
    }
}

/// Current price and stock of a product.
#[instrument(skip(state))]
pub async fn product_price(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<ProductPriceResponse> {
    match state.storage().entities().find::<Product>(&id).await {
        Ok(Some(product)) => Json(product.into()),
        Ok(None) => Json(ProductPriceResponse::default()),
        Err(e) => {
            tracing::error!("Failed to look up product price: {e}");
            Json(ProductPriceResponse::default())
        }
    }
}
