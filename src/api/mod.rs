//! API module containing all versioned API endpoints

pub mod common;
pub mod v1;

use axum::body::Body;
use axum::{middleware, Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::common::middleware::api_version_middleware;
use crate::api::common::tracing::{make_request_span, on_failure, on_request, on_response};
use crate::system::create_system_router;
use crate::system::metrics::metric_layer;
use crate::InnerState;

/// Creates the application router: system routes, every API version and the shared layers.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so client IPs resolve.
#[tracing::instrument(name = "create_app_router", skip(state))]
pub fn create_app_router(state: InnerState) -> Router {
    tracing::info!("Creating app router with versioned endpoints");

    let trusted_proxies = state.settings.trusted_proxies.clone();

    Router::new()
        .merge(create_system_router())
        .merge(v1::create_v1_router(state.clone()))
        .layer(middleware::from_fn(api_version_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_request_span::<Body>)
                .on_request(on_request::<Body>)
                .on_response(on_response::<Body>)
                .on_failure(on_failure),
        )
        .layer(CorsLayer::permissive())
        .layer(metric_layer())
        .layer(Extension(trusted_proxies))
        .with_state(state)
}
