//! Order creation and lookup endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{BuyerId, Order, OrderId, OrderLine, ProductId};
use domain::{CreateOrderRequest, OrderError, OrderService};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::InventoryStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: InventoryStore> {
    pub order_service: OrderService<S>,
}

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateOrderPayload {
    pub buyer_id: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    pub lines: Vec<OrderLinePayload>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLinePayload {
    pub product_id: i64,
    pub quantity: i64,
}

impl CreateOrderPayload {
    /// Converts wire types into a domain request.
    ///
    /// Non-positive quantities are passed through as zero so the domain
    /// validation reports them; only quantities too large to represent are
    /// rejected here.
    pub fn into_request(self) -> Result<CreateOrderRequest, OrderError> {
        let mut request = CreateOrderRequest::new(BuyerId::new(self.buyer_id));
        request.comment = self.comment;
        request.delivery_address = self.delivery_address;

        for (i, line) in self.lines.into_iter().enumerate() {
            let quantity = u32::try_from(line.quantity.max(0)).map_err(|_| {
                OrderError::invalid(
                    format!("lines[{i}].quantity"),
                    format!("must be at most {}", u32::MAX),
                )
            })?;
            request = request.with_line(ProductId::new(line.product_id), quantity);
        }

        Ok(request)
    }
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub buyer_id: i64,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub total: Decimal,
    pub comment: Option<String>,
    pub delivery_address: Option<String>,
    pub active: bool,
    pub lines: Vec<OrderLineResponse>,
}

#[derive(Debug, Serialize)]
pub struct OrderLineResponse {
    pub id: i64,
    pub product_id: i64,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl From<&OrderLine> for OrderLineResponse {
    fn from(line: &OrderLine) -> Self {
        Self {
            id: line.id,
            product_id: line.product_id.as_i64(),
            quantity: line.quantity,
            unit_price: line.unit_price.to_decimal(),
            subtotal: line.subtotal.to_decimal(),
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.as_i64(),
            buyer_id: order.buyer_id.as_i64(),
            created_at: order.created_at,
            status: order.status.to_string(),
            total: order.total.to_decimal(),
            active: order.active,
            lines: order.lines.iter().map(OrderLineResponse::from).collect(),
            order_number: order.order_number,
            comment: order.comment,
            delivery_address: order.delivery_address,
        }
    }
}

// -- Handlers --

/// POST /orders — create an order, decrementing stock atomically.
#[tracing::instrument(skip(state, payload))]
pub async fn create<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<CreateOrderPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let Json(payload) = payload?;
    let request = payload.into_request()?;
    let order = state.order_service.create_order(request).await?;

    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/{id} — load an order by storage id.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.get_order(OrderId::new(id)).await?;
    Ok(Json(order.into()))
}

/// GET /orders/by-number/{number} — load an order by its order number.
#[tracing::instrument(skip(state))]
pub async fn get_by_number<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(number): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order = state.order_service.get_order_by_number(&number).await?;
    Ok(Json(order.into()))
}

/// DELETE /orders/{id} — soft-delete an order.
#[tracing::instrument(skip(state))]
pub async fn deactivate<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .order_service
        .deactivate_order(OrderId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /buyers/{id}/orders — list a buyer's active orders.
#[tracing::instrument(skip(state))]
pub async fn for_buyer<S: InventoryStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state
        .order_service
        .orders_for_buyer(BuyerId::new(id))
        .await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
