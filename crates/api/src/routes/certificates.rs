//! Certificate routes.
//!
//! Issuing a certificate debits its tariff from the fund; changing its tier
//! posts the cost difference as an adjustment.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Actor};
use bolsa_core::correction::CorrectionOutcome;
use bolsa_core::fund::{
    CertificateDetails, CertificateRecord, CertificateUpdate, DetailsUpdate, IssuedCertificate,
};
use bolsa_core::ledger::LedgerEntry;
use bolsa_core::tariff::Tier;
use bolsa_shared::{CertificateId, Money};

/// Creates the certificate routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/certificates", get(list_certificates).post(issue_certificate))
        .route(
            "/certificates/{certificate_id}",
            get(get_certificate).put(update_certificate),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for issuing a certificate.
#[derive(Debug, Deserialize)]
pub struct IssueCertificateRequest {
    /// Displacement tier, e.g. `low_displacement` or `100_200cc`.
    pub tier: String,
    /// Vehicle plate.
    pub plate: String,
    /// Owner identity document.
    pub owner_document: Option<String>,
    /// Owner full name.
    pub owner_name: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Request body for updating a certificate.
///
/// Absent fields are left untouched; an empty string clears an optional field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCertificateRequest {
    /// New displacement tier.
    pub tier: Option<String>,
    /// New plate.
    pub plate: Option<String>,
    /// New owner document.
    pub owner_document: Option<String>,
    /// New owner name.
    pub owner_name: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

/// Response for an issued certificate.
#[derive(Debug, Serialize)]
pub struct IssuedCertificateResponse {
    /// The stored certificate.
    pub certificate: CertificateRecord,
    /// The DEBIT entry.
    pub entry: LedgerEntry,
    /// Balance after the debit.
    pub new_balance: Money,
}

impl From<IssuedCertificate> for IssuedCertificateResponse {
    fn from(issued: IssuedCertificate) -> Self {
        let new_balance = issued.receipt.new_balance();
        Self {
            certificate: issued.record,
            entry: issued.receipt.posting.entry,
            new_balance,
        }
    }
}

/// Response for an updated certificate.
#[derive(Debug, Serialize)]
pub struct UpdatedCertificateResponse {
    /// The stored certificate after the update.
    pub certificate: CertificateRecord,
    /// Ledger effect of a tier change, if any.
    pub correction: Option<CorrectionOutcome>,
}

/// Response for a certificate listing.
#[derive(Debug, Serialize)]
pub struct CertificatesResponse {
    /// Certificates, newest first.
    pub certificates: Vec<CertificateRecord>,
}

fn parse_tier(raw: &str) -> Result<Tier, ApiError> {
    Ok(raw.parse::<Tier>()?)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST `/certificates` - Issue a certificate and debit its tariff.
async fn issue_certificate(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Json(payload): Json<IssueCertificateRequest>,
) -> Result<(StatusCode, Json<IssuedCertificateResponse>), ApiError> {
    let tier = parse_tier(&payload.tier)?;
    let details = CertificateDetails {
        plate: payload.plate,
        owner_document: payload.owner_document,
        owner_name: payload.owner_name,
        notes: payload.notes,
    };

    let issued = state.fund.issue_certificate(tier, details, actor.clone()).await?;

    info!(
        certificate_id = %issued.record.id,
        tier = %tier,
        total = %issued.record.total,
        actor = %actor,
        "Certificate issued"
    );
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// GET `/certificates` - List certificates.
async fn list_certificates(
    State(state): State<AppState>,
) -> Result<Json<CertificatesResponse>, ApiError> {
    let certificates = state.fund.certificates().await?;
    Ok(Json(CertificatesResponse { certificates }))
}

/// GET `/certificates/{certificate_id}` - Get a certificate.
async fn get_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<Uuid>,
) -> Result<Json<CertificateRecord>, ApiError> {
    let record = state
        .fund
        .certificate(CertificateId::from_uuid(certificate_id))
        .await?;
    Ok(Json(record))
}

/// PUT `/certificates/{certificate_id}` - Change tier and/or details.
async fn update_certificate(
    State(state): State<AppState>,
    Actor(actor): Actor,
    Path(certificate_id): Path<Uuid>,
    Json(payload): Json<UpdateCertificateRequest>,
) -> Result<Json<UpdatedCertificateResponse>, ApiError> {
    let tier = payload.tier.as_deref().map(parse_tier).transpose()?;
    let update = CertificateUpdate {
        tier,
        details: DetailsUpdate {
            plate: payload.plate,
            owner_document: payload.owner_document,
            owner_name: payload.owner_name,
            notes: payload.notes,
        },
    };

    let corrected = state
        .fund
        .correct_certificate(CertificateId::from_uuid(certificate_id), update, actor.clone())
        .await?;

    if let Some(correction) = &corrected.correction {
        info!(
            certificate_id = %certificate_id,
            delta = %correction.delta(),
            new_balance = %correction.new_balance,
            actor = %actor,
            "Certificate tier corrected"
        );
    }

    Ok(Json(UpdatedCertificateResponse {
        certificate: corrected.record,
        correction: corrected.correction,
    }))
}
