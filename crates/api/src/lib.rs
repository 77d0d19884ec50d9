//! HTTP API for the grocery ordering backend.
//!
//! REST endpoints for addresses, cart, checkout, order tracking and operator
//! status updates, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::Authenticator;
pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/addresses",
            get(routes::addresses::list::<S>).post(routes::addresses::create::<S>),
        )
        .route(
            "/addresses/{id}",
            put(routes::addresses::update::<S>).delete(routes::addresses::delete::<S>),
        )
        .route(
            "/addresses/{id}/default",
            put(routes::addresses::set_default::<S>),
        )
        .route("/cart", get(routes::cart::summary::<S>))
        .route("/cart/add", post(routes::cart::add::<S>))
        .route("/cart/update/{id}", put(routes::cart::update::<S>))
        .route("/cart/remove/{id}", delete(routes::cart::remove::<S>))
        .route("/cart/clear", delete(routes::cart::clear::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/create", post(routes::orders::create::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/track", get(routes::orders::track::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/admin/orders/{id}/status",
            post(routes::admin::update_status::<S>),
        )
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

/// Creates the application state over `store`.
pub fn create_state<S: Store>(
    store: S,
    authenticator: Arc<dyn Authenticator>,
    order_number_attempts: u32,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, authenticator, order_number_attempts))
}
