//! Liveness endpoint

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use kernel::AppEnv;
use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct HealthState {
    started: Instant,
    env: AppEnv,
}

impl HealthState {
    pub fn new(env: AppEnv) -> Self {
        Self {
            started: Instant::now(),
            env,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    /// Seconds since startup
    pub uptime: f64,
    pub environment: AppEnv,
}

/// GET /health
pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now(),
        uptime: state.started.elapsed().as_secs_f64(),
        environment: state.env,
    })
}
