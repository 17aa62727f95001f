//! Recharge and certificate records, and the registries that keep them.
//!
//! Records live outside the ledger. The ledger only knows them by ID through
//! entry references; the registries are the collaborators that store their
//! descriptive data.

use async_trait::async_trait;
use bolsa_shared::{ActorId, CertificateId, Money, RechargeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::RecordError;
use crate::tariff::{Tariff, Tier};

/// A recharge of the fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RechargeRecord {
    /// Recharge ID; referenced by its CREDIT entry.
    pub id: RechargeId,
    /// Amount credited; always positive.
    pub amount: Money,
    /// External reference such as a bank slip number.
    pub external_reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Who registered the recharge.
    pub registered_by: ActorId,
    /// Registration time.
    pub registered_at: DateTime<Utc>,
}

/// Descriptive data of a certificate, without any financial field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDetails {
    /// Vehicle plate.
    pub plate: String,
    /// Owner identity document.
    pub owner_document: Option<String>,
    /// Owner full name.
    pub owner_name: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CertificateDetails {
    /// Trims every field and upper-cases the plate and owner fields.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Invalid` if the plate is blank.
    pub fn normalized(self) -> Result<Self, RecordError> {
        let plate = self.plate.trim().to_uppercase();
        if plate.is_empty() {
            return Err(RecordError::Invalid("plate must not be blank".to_string()));
        }
        Ok(Self {
            plate,
            owner_document: clean(self.owner_document).map(|doc| doc.to_uppercase()),
            owner_name: clean(self.owner_name).map(|name| name.to_uppercase()),
            notes: clean(self.notes),
        })
    }
}

/// Partial update of a certificate's descriptive data.
///
/// `None` leaves a field untouched; an empty string clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsUpdate {
    /// New plate.
    pub plate: Option<String>,
    /// New owner document.
    pub owner_document: Option<String>,
    /// New owner name.
    pub owner_name: Option<String>,
    /// New notes.
    pub notes: Option<String>,
}

impl DetailsUpdate {
    /// True when the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.plate.is_none()
            && self.owner_document.is_none()
            && self.owner_name.is_none()
            && self.notes.is_none()
    }

    /// Applies the update to `details`, normalizing the result.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Invalid` if the resulting plate is blank.
    pub fn apply_to(&self, details: &CertificateDetails) -> Result<CertificateDetails, RecordError> {
        CertificateDetails {
            plate: self.plate.clone().unwrap_or_else(|| details.plate.clone()),
            owner_document: self
                .owner_document
                .clone()
                .or_else(|| details.owner_document.clone()),
            owner_name: self.owner_name.clone().or_else(|| details.owner_name.clone()),
            notes: self.notes.clone().or_else(|| details.notes.clone()),
        }
        .normalized()
    }
}

/// An issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    /// Certificate ID; referenced by its ISSUANCE and CORRECTION entries.
    pub id: CertificateId,
    /// Descriptive data.
    #[serde(flatten)]
    pub details: CertificateDetails,
    /// Current tier.
    pub tier: Tier,
    /// Base value of the current tier.
    pub base_value: Money,
    /// Commission of the current tier.
    pub commission: Money,
    /// Total cost currently accounted for in the ledger.
    pub total: Money,
    /// Who issued the certificate.
    pub issued_by: ActorId,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl CertificateRecord {
    /// Builds the record of a freshly issued certificate.
    #[must_use]
    pub fn issued(
        id: CertificateId,
        details: CertificateDetails,
        tier: Tier,
        tariff: Tariff,
        issued_by: ActorId,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            details,
            tier,
            base_value: tariff.base_value,
            commission: tariff.commission,
            total: tariff.total(),
            issued_by,
            issued_at,
            updated_at: issued_at,
        }
    }
}

/// New financial state of a corrected certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierChange {
    /// New tier.
    pub tier: Tier,
    /// Tariff of the new tier.
    pub tariff: Tariff,
    /// Total the correction was computed against.
    pub prior_total: Money,
    /// Descriptive data written in the same update, if edited too.
    pub details: Option<CertificateDetails>,
}

/// Storage of recharge records.
#[async_trait]
pub trait RechargeRegistry: Send + Sync {
    /// Stores a new recharge.
    async fn insert(&self, record: RechargeRecord) -> Result<RechargeRecord, RecordError>;

    /// Removes a recharge whose credit was never applied.
    async fn discard(&self, id: RechargeId) -> Result<(), RecordError>;

    /// All recharges, newest first.
    async fn list(&self) -> Result<Vec<RechargeRecord>, RecordError>;
}

/// Storage of certificate records.
#[async_trait]
pub trait CertificateRegistry: Send + Sync {
    /// Stores a newly issued certificate.
    async fn insert(&self, record: CertificateRecord) -> Result<CertificateRecord, RecordError>;

    /// Looks up a certificate.
    async fn find(&self, id: CertificateId) -> Result<Option<CertificateRecord>, RecordError>;

    /// All certificates, newest first.
    async fn list(&self) -> Result<Vec<CertificateRecord>, RecordError>;

    /// Moves a certificate to a new tier, with its details if given.
    ///
    /// Only applies if the stored total still equals `change.prior_total`;
    /// otherwise fails with `RecordError::Stale` and changes nothing.
    async fn change_tier(
        &self,
        id: CertificateId,
        change: &TierChange,
    ) -> Result<CertificateRecord, RecordError>;

    /// Replaces the descriptive data of a certificate.
    async fn update_details(
        &self,
        id: CertificateId,
        details: &CertificateDetails,
    ) -> Result<CertificateRecord, RecordError>;
}
