//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod certificates;
pub mod health;
pub mod ledger;
pub mod recharges;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(ledger::routes())
        .merge(recharges::routes())
        .merge(certificates::routes())
}
