//! Order placement, cancellation, and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{CartService, CatalogService, OrderService, PlacedOrder};
use serde::Serialize;
use store::CommerceStore;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AuthedUser;

/// Shared application state accessible from all handlers.
pub struct AppState<S: CommerceStore> {
    pub orders: OrderService<S>,
    pub cart: CartService<S>,
    pub catalog: CatalogService<S>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: i32,
    /// Unit price at the time of purchase, in cents.
    pub price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_cents: i64,
    pub created_at: String,
}

pub(crate) fn order_response(placed: &PlacedOrder) -> OrderResponse {
    OrderResponse {
        id: placed.order.id.to_string(),
        status: placed.order.status.to_string(),
        items: placed
            .items
            .iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
                price_cents: item.price.cents(),
            })
            .collect(),
        total_cents: placed.order.total.cents(),
        created_at: placed.order.created_at.to_rfc3339(),
    }
}

pub(crate) fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}

// -- Handlers --

/// POST /orders/create — convert the caller's cart into an order.
#[tracing::instrument(skip(state))]
pub async fn create<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let placed = state.orders.place_order(user).await?;
    Ok((StatusCode::CREATED, Json(order_response(&placed))))
}

/// POST /orders/{id}/cancel — cancel a pending order, restoring stock.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id(&id)?.into();
    let cancelled = state.orders.cancel_order(user, order_id).await?;
    Ok(Json(order_response(&cancelled)))
}

/// GET /orders — list the caller's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.orders.orders(user).await?;
    Ok(Json(orders.iter().map(order_response).collect()))
}

/// GET /orders/{id} — load one of the caller's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_id(&id)?.into();
    let placed = state
        .orders
        .order(user, order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;
    Ok(Json(order_response(&placed)))
}
