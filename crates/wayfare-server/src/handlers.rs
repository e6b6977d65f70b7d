use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub store: StoreStatus,
    pub cache: CacheStatus,
}

#[derive(Debug, Serialize)]
pub struct StoreStatus {
    pub backend: &'static str,
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub mode: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// Reports store connectivity and cache mode.
///
/// A disconnected store still answers 200 with `"degraded"`: country reads
/// keep working from the offline dataset.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.countries.store();
    let connected = store.is_connected();
    let body = ReadinessResponse {
        status: if connected { "ready" } else { "degraded" },
        store: StoreStatus {
            backend: store.backend_name(),
            connected,
        },
        cache: CacheStatus {
            mode: state.countries.cache().mode(),
        },
    };
    (StatusCode::OK, Json(body))
}

pub async fn metrics() -> impl IntoResponse {
    match crate::metrics::render_metrics() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}
