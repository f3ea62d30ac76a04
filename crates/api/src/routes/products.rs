//! Product read-back endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Product, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use store::InventoryStore;

use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
    pub active: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.as_i64(),
            name: product.name,
            price: product.price.to_decimal(),
            stock: product.stock,
            active: product.active,
        }
    }
}

/// GET /products/{id} — current price and stock of a product.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.order_service.get_product(ProductId::new(id)).await?;
    Ok(Json(product.into()))
}
