//! Balance and ledger routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError};
use bolsa_core::fund::AuditReport;
use bolsa_core::ledger::{Balance, EntryFilter, LedgerEntry, ReferenceKind};
use bolsa_shared::Money;

/// Creates the balance and ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/ledger/entries", get(list_entries))
        .route("/ledger/audit", get(audit))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for the current balance.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Current amount.
    pub amount: Money,
    /// Number of entries applied so far.
    pub version: i64,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            amount: balance.amount,
            version: balance.version,
            updated_at: balance.updated_at,
        }
    }
}

/// Query parameters for listing ledger entries.
#[derive(Debug, Default, Deserialize)]
pub struct ListEntriesQuery {
    /// `recharge`, `issuance` or `correction`.
    pub reference_kind: Option<String>,
    /// Recharge or certificate ID.
    pub reference_id: Option<Uuid>,
    /// Only entries created at or after this RFC 3339 instant.
    pub since: Option<DateTime<Utc>>,
}

impl ListEntriesQuery {
    fn into_filter(self) -> Result<EntryFilter, ApiError> {
        let reference_kind = self
            .reference_kind
            .map(|raw| raw.parse::<ReferenceKind>())
            .transpose()
            .map_err(|message| ApiError::bad_request("invalid_reference_kind", message))?;

        Ok(EntryFilter {
            reference_kind,
            reference_id: self.reference_id,
            since: self.since,
        })
    }
}

/// Response for a ledger listing.
#[derive(Debug, Serialize)]
pub struct EntriesResponse {
    /// Matching entries in append order.
    pub entries: Vec<LedgerEntry>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/balance` - Current fund balance.
async fn get_balance(State(state): State<AppState>) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.fund.get_balance().await?;
    Ok(Json(balance.into()))
}

/// GET `/ledger/entries` - Ledger entries, optionally filtered.
async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<ListEntriesQuery>,
) -> Result<Json<EntriesResponse>, ApiError> {
    let filter = query.into_filter()?;
    let entries = state.fund.list_entries(&filter).await?;
    Ok(Json(EntriesResponse { entries }))
}

/// GET `/ledger/audit` - Replays the ledger against the stored balance.
async fn audit(State(state): State<AppState>) -> Result<Json<AuditReport>, ApiError> {
    Ok(Json(state.fund.audit().await?))
}
