//! Health and observability endpoints.
//!
//! `/health` reports liveness plus build metadata, `/health/ready` performs a
//! live database ping so orchestrators can gate traffic, and `/metrics`
//! exposes the process-wide Prometheus registry in text format.

use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::errors::ServiceError;

/// Shared state for the health endpoints.
pub struct HealthState {
    db: Arc<DatabaseConnection>,
    start_time: SystemTime,
}

impl HealthState {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            start_time: SystemTime::now(),
        }
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().map(|d| d.as_secs()).unwrap_or(0)
    }
}

/// Basic liveness probe with version info. Always 200 while the process runs.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is running")
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Readiness probe. Pings the database and returns 503 until it responds.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Service is ready to accept traffic"),
        (status = 503, description = "Database is unreachable")
    ),
    tag = "Health"
)]
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    match crate::db::check_connection(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "ready": true, "database": "up" })),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "ready": false, "database": "down" })),
        ),
    }
}

/// Prometheus metrics in text exposition format.
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Metrics in Prometheus text format")
    ),
    tag = "Health"
)]
pub async fn metrics(State(_state): State<Arc<HealthState>>) -> Result<impl IntoResponse, ServiceError> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| ServiceError::InternalError(format!("Failed to encode metrics: {}", e)))?;
    let body = String::from_utf8(buffer)
        .map_err(|e| ServiceError::InternalError(format!("Metrics are not valid UTF-8: {}", e)))?;
    Ok(body)
}

/// Router for the health and metrics endpoints. These sit outside the
/// authenticated API surface.
pub fn health_routes(db: Arc<DatabaseConnection>) -> Router {
    let state = Arc::new(HealthState::new(db));
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .with_state(state)
}
