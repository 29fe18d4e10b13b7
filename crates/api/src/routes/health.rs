//! `GET /health`: liveness plus a database round trip.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `"ok"` or `"unavailable"`.
    pub status: &'static str,
    /// `"up"` when `SELECT 1` succeeds, otherwise `"down"`.
    pub database: &'static str,
    pub version: &'static str,
}

impl HealthReport {
    fn new(database_up: bool) -> Self {
        Self {
            status: if database_up { "ok" } else { "unavailable" },
            database: if database_up { "up" } else { "down" },
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn status_code(&self) -> StatusCode {
        if self.database == "up" {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Every endpoint needs the database, so an unreachable one makes the
/// service unavailable (503) rather than degraded.
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = match notes_db::health_check(&state.pool).await {
        Ok(()) => HealthReport::new(true),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            HealthReport::new(false)
        }
    };
    (report.status_code(), Json(report))
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
