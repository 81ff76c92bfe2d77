//! HTTP API server with observability for the storefront backend.
//!
//! Provides REST endpoints for the product catalog, the caller's cart,
//! and order placement/cancellation, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use domain::{CartService, CatalogService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::CommerceStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .route("/products/{id}", patch(routes::products::update::<S>))
        .route("/cart", get(routes::cart::view::<S>))
        .route("/cart", post(routes::cart::add::<S>))
        .route("/cart/{item_id}", patch(routes::cart::update::<S>))
        .route("/cart/{item_id}", delete(routes::cart::remove::<S>))
        .route("/orders/create", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with all services over one store.
pub fn create_state<S: CommerceStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orders: OrderService::new(store.clone()),
        cart: CartService::new(store.clone()),
        catalog: CatalogService::new(store),
    })
}
