//! System-level routes

pub mod health_check;
pub mod metrics;

use axum::{routing::get, Router};

use crate::api::v1::request_info::request_info;
use crate::InnerState;

/// Creates system routes, mounted outside the `api/` prefix
#[tracing::instrument(name = "create_system_router")]
pub fn create_system_router() -> Router<InnerState> {
    tracing::info!("Creating system router");

    Router::new()
        .route("/health", get(health_check::health_check))
        .route("/request-info", get(request_info))
        .route("/metrics", get(metrics::render_metrics))
}
