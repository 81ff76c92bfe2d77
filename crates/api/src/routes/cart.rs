//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::CartView;
use serde::{Deserialize, Serialize};
use store::CommerceStore;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::AuthedUser;
use crate::routes::orders::{AppState, parse_id};
use crate::routes::products::{ProductResponse, product_response};

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: String,
    pub product: ProductResponse,
    pub quantity: i32,
    /// Line total at the product's live price, in cents.
    pub total_price_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: String,
    pub items: Vec<CartItemResponse>,
    pub grand_total_cents: i64,
}

fn cart_response(view: &CartView) -> CartResponse {
    CartResponse {
        id: view.cart_id.to_string(),
        items: view
            .lines
            .iter()
            .map(|line| CartItemResponse {
                id: line.item.id.to_string(),
                product: product_response(&line.product),
                quantity: line.item.quantity,
                total_price_cents: line.line_total().cents(),
            })
            .collect(),
        grand_total_cents: view.grand_total.cents(),
    }
}

// -- Handlers --

/// GET /cart — view the caller's cart, creating it lazily.
#[tracing::instrument(skip(state))]
pub async fn view<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
) -> Result<Json<CartResponse>, ApiError> {
    let view = state.cart.view(user).await?;
    Ok(Json(cart_response(&view)))
}

/// POST /cart — add a product to the cart, or increment its quantity.
///
/// Returns 201 when a new line was created and 200 when an existing line
/// was incremented.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
    Json(req): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<CartResponse>), ApiError> {
    let update = state
        .cart
        .add_item(user, req.product_id.into(), req.quantity)
        .await?;
    let status = if update.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(cart_response(&update.view))))
}

/// PATCH /cart/{item_id} — set a cart line's quantity; zero or less
/// removes the line.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
    Path(item_id): Path<String>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id = parse_id(&item_id)?.into();
    let view = state
        .cart
        .set_item_quantity(user, item_id, req.quantity)
        .await?;
    Ok(Json(cart_response(&view)))
}

/// DELETE /cart/{item_id} — remove a line from the cart.
#[tracing::instrument(skip(state))]
pub async fn remove<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    AuthedUser(user): AuthedUser,
    Path(item_id): Path<String>,
) -> Result<Json<CartResponse>, ApiError> {
    let item_id = parse_id(&item_id)?.into();
    let view = state.cart.remove_item(user, item_id).await?;
    Ok(Json(cart_response(&view)))
}
