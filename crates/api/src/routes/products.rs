//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::Money;
use domain::ProductUpdate;
use serde::{Deserialize, Serialize};
use store::{CommerceStore, Product};

use crate::error::ApiError;
use crate::routes::orders::{AppState, parse_id};

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub price_cents: Option<i64>,
    pub stock: Option<i32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub stock: i32,
    pub created_at: String,
}

pub(crate) fn product_response(product: &Product) -> ProductResponse {
    ProductResponse {
        id: product.id.to_string(),
        name: product.name.clone(),
        price_cents: product.price.cents(),
        stock: product.stock,
        created_at: product.created_at.to_rfc3339(),
    }
}

// -- Handlers --

/// POST /products — add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state
        .catalog
        .add_product(req.name, Money::from_cents(req.price_cents), req.stock)
        .await?;
    Ok((StatusCode::CREATED, Json(product_response(&product))))
}

/// PATCH /products/{id} — update a product's live price and/or stock.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id(&id)?.into();
    let update = ProductUpdate {
        price: req.price_cents.map(Money::from_cents),
        stock: req.stock,
    };
    let product = state.catalog.update_product(product_id, update).await?;
    Ok(Json(product_response(&product)))
}

/// GET /products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.products().await?;
    Ok(Json(products.iter().map(product_response).collect()))
}

/// GET /products/{id} — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = parse_id(&id)?.into();
    let product = state
        .catalog
        .product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product_response(&product)))
}
