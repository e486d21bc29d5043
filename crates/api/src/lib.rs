//! HTTP surface for the storefront order core.
//!
//! Exposes order placement over REST, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{OrderService, ShippingRates};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Storage;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Storage + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
}

/// Builds application state around `storage` with the given shipping rates.
pub fn create_default_state<S: Storage + 'static>(
    storage: S,
    rates: ShippingRates,
) -> Arc<AppState<S>> {
    let order_service = OrderService::with_parts(storage, rates, Arc::new(domain::SystemClock));
    Arc::new(AppState { order_service })
}
