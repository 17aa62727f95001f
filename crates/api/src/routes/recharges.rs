//! Recharge routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError, middleware::Actor};
use bolsa_core::fund::{NewRecharge, RechargeReceipt, RechargeRecord};
use bolsa_core::ledger::LedgerEntry;
use bolsa_shared::Money;

/// Creates the recharge routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/recharges", get(list_recharges).post(create_recharge))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registering a recharge.
#[derive(Debug, Deserialize)]
pub struct CreateRechargeRequest {
    /// Amount in pesos; must be positive.
    pub amount: i64,
    /// External reference such as a bank slip number.
    pub external_reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Response for a registered recharge.
#[derive(Debug, Serialize)]
pub struct RechargeResponse {
    /// The stored recharge.
    pub recharge: RechargeRecord,
    /// The CREDIT entry.
    pub entry: LedgerEntry,
    /// Balance before the credit.
    pub previous_balance: Money,
    /// Balance after the credit.
    pub new_balance: Money,
}

impl From<RechargeReceipt> for RechargeResponse {
    fn from(receipt: RechargeReceipt) -> Self {
        let new_balance = receipt.posting.new_balance();
        Self {
            recharge: receipt.record,
            previous_balance: receipt.posting.previous_balance,
            entry: receipt.posting.entry,
            new_balance,
        }
    }
}

/// Response for a recharge listing.
#[derive(Debug, Serialize)]
pub struct RechargesResponse {
    /// Recharges, newest first.
    pub recharges: Vec<RechargeRecord>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/recharges` - Register a recharge and credit the fund.
async fn create_recharge(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<CreateRechargeRequest>,
) -> Result<(StatusCode, Json<RechargeResponse>), ApiError> {
    let receipt = state
        .fund
        .register_recharge(
            NewRecharge {
                amount: Money::new(payload.amount),
                external_reference: payload.external_reference,
                notes: payload.notes,
            },
            actor.clone(),
        )
        .await?;

    info!(
        recharge_id = %receipt.record.id,
        amount = %receipt.record.amount,
        actor = %actor,
        "Recharge created"
    );
    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// GET `/recharges` - List recharges.
async fn list_recharges(
    State(state): State<AppState>,
) -> Result<Json<RechargesResponse>, ApiError> {
    let recharges = state.fund.recharges().await?;
    Ok(Json(RechargesResponse { recharges }))
}
