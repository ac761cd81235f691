use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: ComponentHealth,
}

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Records the process start for uptime reporting.
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

/// Liveness: the process answers.
async fn liveness() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": ComponentStatus::Up,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: the database answers a ping. 503 otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let result = crate::db::check_connection(&state.db).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let database = match result {
        Ok(()) => ComponentHealth {
            status: ComponentStatus::Up,
            error: None,
            latency_ms,
        },
        Err(err) => ComponentHealth {
            status: ComponentStatus::Down,
            error: Some(err.to_string()),
            latency_ms,
        },
    };
    let status = database.status;
    let code = match status {
        ComponentStatus::Up => StatusCode::OK,
        ComponentStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: uptime_secs(),
            database,
        }),
    )
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(readiness))
        .route("/live", get(liveness))
}
