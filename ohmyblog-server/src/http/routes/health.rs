//! Health check endpoint

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Upper bound for the database check
const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
}

impl HealthResponse {
    fn new(uptime: Duration, database_up: bool) -> Self {
        Self {
            status: if database_up { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            uptime_seconds: uptime.as_secs(),
            timestamp: Utc::now(),
            database: if database_up { "up" } else { "down" },
        }
    }
}

/// GET /health - 200 when the database answers, 503 otherwise
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database_up = state.db.ping(DB_CHECK_TIMEOUT).await;
    if !database_up {
        tracing::warn!("health check: database unreachable");
    }
    let status = if database_up {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthResponse::new(state.uptime(), database_up)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_response() {
        let body = HealthResponse::new(Duration::from_millis(61_500), true);
        assert_eq!(body.status, "ok");
        assert_eq!(body.database, "up");
        assert_eq!(body.uptime_seconds, 61);
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn degraded_without_database() {
        let body = HealthResponse::new(Duration::ZERO, false);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.database, "down");
    }
}
