//! API Version 1 endpoints

pub mod request_info;

use axum::routing::get;
use axum::{middleware, Router};

use crate::api::common::middleware::auth_middleware;
use crate::InnerState;

/// Creates the V1 API router
#[tracing::instrument(name = "create_v1_router", skip(state))]
pub fn create_v1_router(state: InnerState) -> Router<InnerState> {
    tracing::info!("Creating V1 API router");

    Router::new()
        .route("/api/v1/me", get(request_info::me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route("/api/v1/request-info", get(request_info::request_info))
}
