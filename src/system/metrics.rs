//! Prometheus request metrics.
//!
//! `PrometheusMetricLayer::pair` installs the process-wide recorder, so the pair is built once and
//! every router shares it.

use axum::response::IntoResponse;
use axum_prometheus::PrometheusMetricLayer;
use metrics_exporter_prometheus::PrometheusHandle;
use once_cell::sync::Lazy;

static METRICS: Lazy<(PrometheusMetricLayer<'static>, PrometheusHandle)> =
    Lazy::new(PrometheusMetricLayer::pair);

/// Layer recording request counts and latencies.
pub fn metric_layer() -> PrometheusMetricLayer<'static> {
    METRICS.0.clone()
}

pub async fn render_metrics() -> impl IntoResponse {
    METRICS.1.render()
}
