//! Health check endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when the ledger store answers, `degraded` otherwise.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Current balance version, when the store is reachable.
    pub ledger_version: Option<i64>,
}

/// Health check handler.
///
/// Reads the balance so a broken database shows up as a 503.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let version = env!("CARGO_PKG_VERSION").to_string();
    match state.fund.get_balance().await {
        Ok(balance) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                version,
                ledger_version: Some(balance.version),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Health check could not read the balance");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    version,
                    ledger_version: None,
                }),
            )
        }
    }
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
