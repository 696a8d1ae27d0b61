//! WMTS proxy library.
//!
//! Resolves LV95 tile addresses to ground bounding boxes and the WMS GetMap
//! requests that render them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router.
///
/// `/metrics` is only mounted when a Prometheus recorder is installed.
pub fn build_router(state: Arc<AppState>, prometheus: Option<PrometheusHandle>) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/grid", get(handlers::grid_handler))
        .route("/tiles/:zoom/:col/:row", get(handlers::tile_handler))
        .route("/tiles/:zoom/:col/:row/wms", get(handlers::tile_wms_handler))
        .route("/locate/:zoom", get(handlers::locate_handler))
        .route("/cover/:zoom", get(handlers::cover_handler));

    if let Some(handle) = prometheus {
        app = app
            .route("/metrics", get(handlers::metrics_handler))
            .layer(Extension(handle));
    }

    app.layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
