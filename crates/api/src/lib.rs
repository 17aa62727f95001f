//! HTTP API layer with Axum routes over the fund service.
//!
//! This crate provides:
//! - REST API routes for the balance, recharges, certificates and ledger
//! - The caller identity extractor
//! - JSON error rendering

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use bolsa_core::fund::FundService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fund service: ledger operations and record workflows.
    pub fund: FundService,
}

impl AppState {
    /// Creates the state.
    #[must_use]
    pub const fn new(fund: FundService) -> Self {
        Self { fund }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
