//! HTTP exposition server.
//!
//! Serves the Prometheus text format at [`METRICS_PATH`] and a liveness
//! probe at `/healthz`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::collector::{Collector, encode_text};

/// Path of the metrics endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<dyn Collector>,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(state)
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Scrape endpoint: runs one collection cycle and encodes the result.
///
/// The cycle runs on its own task so that it completes even if the client
/// goes away mid-scrape.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let collector = Arc::clone(&state.collector);
    let families = match tokio::spawn(async move { collector.collect().await }).await {
        Ok(families) => families,
        Err(e) => {
            tracing::error!(error = %e, "Collection task failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response();
        }
    };

    match encode_text(&families) {
        Ok(body) => (
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e)).into_response()
        }
    }
}
