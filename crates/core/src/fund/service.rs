//! Fund service: the interface the surrounding service talks to.
//!
//! The section-level operations (`get_balance`, `record_recharge`,
//! `issue_certificate_debit`, `correct_certificate_tier`, `list_entries`)
//! only touch the ledger. The workflows (`register_recharge`,
//! `issue_certificate`, `correct_certificate`) also keep the recharge and
//! certificate records in step with the ledger, compensating the ledger
//! side when a record cannot be written.

use std::sync::Arc;

use bolsa_shared::{ActorId, AppConfig, AppResult, CertificateId, Money, RechargeId};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use super::error::{FundError, RecordError};
use super::records::{
    CertificateDetails, CertificateRecord, CertificateRegistry, DetailsUpdate, RechargeRecord,
    RechargeRegistry, TierChange,
};
use crate::correction::{CorrectionCalculator, CorrectionOutcome};
use crate::ledger::{
    Balance, BalanceEngine, EntryFilter, LedgerEntry, LedgerError, LedgerSummary, LedgerStore,
    Posting, Reconciliation, Reference, RetryPolicy, reconcile, summarize,
};
use crate::tariff::{Tariff, TariffResolver, Tier};

/// Result of debiting the fund for a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuanceReceipt {
    /// Certificate the debit belongs to.
    pub certificate_id: CertificateId,
    /// Tier the certificate was priced at.
    pub tier: Tier,
    /// Tariff applied.
    pub tariff: Tariff,
    /// The DEBIT entry.
    pub posting: Posting,
}

impl IssuanceReceipt {
    /// Amount debited.
    #[must_use]
    pub const fn total_cost(&self) -> Money {
        self.tariff.total()
    }

    /// Fund balance after the debit.
    #[must_use]
    pub const fn new_balance(&self) -> Money {
        self.posting.new_balance()
    }
}

/// Input of [`FundService::register_recharge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecharge {
    /// Amount to credit.
    pub amount: Money,
    /// External reference such as a bank slip number.
    pub external_reference: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A registered recharge with its ledger posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RechargeReceipt {
    /// The stored record.
    pub record: RechargeRecord,
    /// The CREDIT entry.
    pub posting: Posting,
}

/// An issued certificate with its ledger receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCertificate {
    /// The stored record.
    pub record: CertificateRecord,
    /// The debit receipt.
    pub receipt: IssuanceReceipt,
}

/// Changes requested for an issued certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateUpdate {
    /// New tier, if it changes.
    pub tier: Option<Tier>,
    /// Descriptive data changes.
    pub details: DetailsUpdate,
}

/// An updated certificate with the correction applied, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectedCertificate {
    /// The stored record after the update.
    pub record: CertificateRecord,
    /// Ledger effect; absent when the tier did not change.
    pub correction: Option<CorrectionOutcome>,
}

/// Ledger health report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// Stored balance compared with the replayed ledger.
    pub reconciliation: Reconciliation,
    /// Ledger totals.
    pub summary: LedgerSummary,
}

/// Balance ledger plus the records that explain it.
#[derive(Clone)]
pub struct FundService {
    engine: BalanceEngine,
    resolver: TariffResolver,
    recharges: Arc<dyn RechargeRegistry>,
    certificates: Arc<dyn CertificateRegistry>,
}

impl std::fmt::Debug for FundService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FundService")
            .field("engine", &self.engine)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl FundService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        recharges: Arc<dyn RechargeRegistry>,
        certificates: Arc<dyn CertificateRegistry>,
        resolver: TariffResolver,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            engine: BalanceEngine::new(store, retry),
            resolver,
            recharges,
            certificates,
        }
    }

    /// Creates the service with tariffs and retry policy from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the configured tariffs are unusable.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn LedgerStore>,
        recharges: Arc<dyn RechargeRegistry>,
        certificates: Arc<dyn CertificateRegistry>,
    ) -> AppResult<Self> {
        Ok(Self::new(
            store,
            recharges,
            certificates,
            TariffResolver::from_config(&config.tariffs)?,
            RetryPolicy::from(&config.ledger),
        ))
    }

    /// The tariff table in use.
    #[must_use]
    pub const fn resolver(&self) -> &TariffResolver {
        &self.resolver
    }

    // ========== Ledger operations ==========

    /// Current balance.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the store is unreachable.
    pub async fn get_balance(&self) -> Result<Balance, LedgerError> {
        self.engine.balance().await
    }

    /// Credits a recharge.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `amount <= 0`, plus engine errors.
    pub async fn record_recharge(
        &self,
        amount: Money,
        actor: ActorId,
        recharge_id: RechargeId,
    ) -> Result<Posting, LedgerError> {
        self.engine
            .credit(amount, Reference::recharge(recharge_id), actor)
            .await
    }

    /// Debits the cost of a certificate of `tier`.
    ///
    /// # Errors
    ///
    /// `InvalidTier`, `InsufficientFunds`, plus engine errors.
    pub async fn issue_certificate_debit(
        &self,
        tier: Tier,
        actor: ActorId,
        certificate_id: CertificateId,
    ) -> Result<IssuanceReceipt, LedgerError> {
        let tariff = self.resolver.resolve(tier)?;
        let posting = self
            .engine
            .debit(tariff.total(), Reference::issuance(certificate_id), actor)
            .await?;

        Ok(IssuanceReceipt {
            certificate_id,
            tier,
            tariff,
            posting,
        })
    }

    /// Adjusts the fund for a certificate moving from `prior_total` to `new_tier`.
    ///
    /// # Errors
    ///
    /// `InvalidTier`, `InsufficientFunds`, plus engine errors.
    pub async fn correct_certificate_tier(
        &self,
        certificate_id: CertificateId,
        prior_total: Money,
        new_tier: Tier,
        actor: ActorId,
    ) -> Result<CorrectionOutcome, LedgerError> {
        CorrectionCalculator::new(&self.resolver)
            .apply(&self.engine, certificate_id, prior_total, new_tier, actor)
            .await
    }

    /// Ledger entries matching `filter`, in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the store is unreachable.
    pub async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.engine.entries(filter).await
    }

    /// Replays the ledger against the stored balance.
    ///
    /// # Errors
    ///
    /// `StorageFailure` if the store is unreachable; `Overflow` if the
    /// history cannot be replayed or totalled.
    pub async fn audit(&self) -> Result<AuditReport, LedgerError> {
        let balance = self.engine.balance().await?;
        let entries = self.engine.entries(&EntryFilter::default()).await?;

        let reconciliation = reconcile(&balance, &entries).map_err(|violation| {
            error!(%violation, "ledger chain is corrupt");
            LedgerError::StorageFailure(violation.to_string())
        })?;
        if !reconciliation.consistent {
            error!(
                stored = %reconciliation.stored_balance,
                replayed = %reconciliation.replayed_balance,
                version = reconciliation.stored_version,
                "balance does not match the ledger"
            );
        }

        Ok(AuditReport {
            reconciliation,
            summary: summarize(&entries)?,
        })
    }

    // ========== Workflows ==========

    /// Registers a recharge and credits it.
    ///
    /// If the credit fails the record is discarded, so no recharge exists
    /// without its CREDIT entry.
    ///
    /// # Errors
    ///
    /// - `Ledger` / `Record` errors of either step
    /// - `CompensationFailed` if the record could not be discarded
    pub async fn register_recharge(
        &self,
        request: NewRecharge,
        actor: ActorId,
    ) -> Result<RechargeReceipt, FundError> {
        // 1. Validate before touching any collaborator
        if !request.amount.is_positive() {
            return Err(LedgerError::InvalidAmount(request.amount).into());
        }

        // 2. Store the record
        let record = self
            .recharges
            .insert(RechargeRecord {
                id: RechargeId::new(),
                amount: request.amount,
                external_reference: request.external_reference,
                notes: request.notes,
                registered_by: actor.clone(),
                registered_at: Utc::now(),
            })
            .await?;

        // 3. Credit the fund, dropping the record if that fails
        match self.record_recharge(record.amount, actor, record.id).await {
            Ok(posting) => {
                info!(
                    recharge_id = %record.id,
                    amount = %record.amount,
                    new_balance = %posting.new_balance(),
                    "recharge registered"
                );
                Ok(RechargeReceipt { record, posting })
            }
            Err(err) => {
                warn!(recharge_id = %record.id, error = %err, "credit failed, discarding recharge");
                if let Err(discard) = self.recharges.discard(record.id).await {
                    error!(
                        recharge_id = %record.id,
                        error = %discard,
                        "could not discard uncredited recharge"
                    );
                    return Err(FundError::CompensationFailed {
                        reference: Reference::recharge(record.id),
                        cause: err.to_string(),
                        compensation: discard.to_string(),
                    });
                }
                Err(err.into())
            }
        }
    }

    /// Recharges, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if the registry fails.
    pub async fn recharges(&self) -> Result<Vec<RechargeRecord>, RecordError> {
        self.recharges.list().await
    }

    /// Debits a certificate and stores it.
    ///
    /// If the record cannot be stored after a successful debit, a
    /// compensating CREDIT on the same issuance reference restores the fund.
    ///
    /// # Errors
    ///
    /// - `Ledger` errors of the debit (nothing was stored)
    /// - `Record` error of the store step (the debit was compensated)
    /// - `CompensationFailed` if the compensating credit failed too
    pub async fn issue_certificate(
        &self,
        tier: Tier,
        details: CertificateDetails,
        actor: ActorId,
    ) -> Result<IssuedCertificate, FundError> {
        // 1. Validate the record data before reserving funds
        let details = details.normalized()?;
        let certificate_id = CertificateId::new();

        // 2. Reserve by debiting
        let receipt = self
            .issue_certificate_debit(tier, actor.clone(), certificate_id)
            .await?;

        // 3. Mark the certificate issued
        let record = CertificateRecord::issued(
            certificate_id,
            details,
            tier,
            receipt.tariff,
            actor.clone(),
            Utc::now(),
        );

        match self.certificates.insert(record).await {
            Ok(record) => {
                info!(
                    certificate_id = %certificate_id,
                    tier = %tier,
                    total = %receipt.total_cost(),
                    new_balance = %receipt.new_balance(),
                    "certificate issued"
                );
                Ok(IssuedCertificate { record, receipt })
            }
            Err(err) => {
                warn!(
                    certificate_id = %certificate_id,
                    amount = %receipt.total_cost(),
                    error = %err,
                    "certificate not stored, compensating debit"
                );
                let reference = Reference::issuance(certificate_id);
                if let Err(compensation) = self
                    .engine
                    .credit(receipt.total_cost(), reference, actor)
                    .await
                {
                    error!(
                        certificate_id = %certificate_id,
                        error = %compensation,
                        "compensating credit failed"
                    );
                    return Err(FundError::CompensationFailed {
                        reference,
                        cause: err.to_string(),
                        compensation: compensation.to_string(),
                    });
                }
                Err(err.into())
            }
        }
    }

    /// Looks up a certificate.
    ///
    /// # Errors
    ///
    /// `RecordError::NotFound` if it does not exist.
    pub async fn certificate(&self, id: CertificateId) -> Result<CertificateRecord, RecordError> {
        self.certificates
            .find(id)
            .await?
            .ok_or(RecordError::NotFound(id.into_inner()))
    }

    /// Certificates, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RecordError` if the registry fails.
    pub async fn certificates(&self) -> Result<Vec<CertificateRecord>, RecordError> {
        self.certificates.list().await
    }

    /// Changes a certificate's tier and/or descriptive data.
    ///
    /// A tier change is all-or-nothing: the record moves to the new tier only
    /// after the adjustment succeeds, and a record update that fails after a
    /// non-zero adjustment is compensated by the opposite adjustment.
    ///
    /// # Errors
    ///
    /// - `Record(NotFound)` for unknown certificates
    /// - `Ledger` errors of the adjustment (record unchanged)
    /// - `Record(Stale)` if the certificate was corrected concurrently
    /// - `CompensationFailed` if the opposite adjustment failed too
    pub async fn correct_certificate(
        &self,
        id: CertificateId,
        update: CertificateUpdate,
        actor: ActorId,
    ) -> Result<CorrectedCertificate, FundError> {
        // 1. Load and validate before any ledger effect
        let mut record = self.certificate(id).await?;
        let mut details = if update.details.is_empty() {
            None
        } else {
            Some(update.details.apply_to(&record.details)?)
        };

        // 2. Tier change: adjust the fund, then move the record and its details at once
        let mut correction = None;
        if let Some(new_tier) = update.tier.filter(|tier| *tier != record.tier) {
            let outcome = self
                .correct_certificate_tier(id, record.total, new_tier, actor.clone())
                .await?;
            let change = TierChange {
                tier: new_tier,
                tariff: outcome.plan.new_tariff,
                prior_total: record.total,
                details: details.take(),
            };

            match self.certificates.change_tier(id, &change).await {
                Ok(updated) => record = updated,
                Err(err) => return Err(self.undo_correction(id, &outcome, err, actor).await),
            }
            correction = Some(outcome);
        }

        // 3. Descriptive data alone, no ledger effect
        if let Some(details) = details {
            record = self.certificates.update_details(id, &details).await?;
        }

        Ok(CorrectedCertificate { record, correction })
    }

    async fn undo_correction(
        &self,
        id: CertificateId,
        outcome: &CorrectionOutcome,
        cause: RecordError,
        actor: ActorId,
    ) -> FundError {
        let Some(posting) = &outcome.posting else {
            return cause.into();
        };

        warn!(
            certificate_id = %id,
            delta = %outcome.delta(),
            error = %cause,
            "certificate not updated, compensating adjustment"
        );

        let reference = Reference::correction(id);
        let reverted = match posting.entry.amount.checked_neg() {
            Ok(opposite) => self.engine.adjust(opposite, reference, actor).await,
            Err(overflow) => Err(overflow.into()),
        };

        match reverted {
            Ok(_) => cause.into(),
            Err(compensation) => {
                error!(
                    certificate_id = %id,
                    error = %compensation,
                    "compensating adjustment failed"
                );
                FundError::CompensationFailed {
                    reference,
                    cause: cause.to_string(),
                    compensation: compensation.to_string(),
                }
            }
        }
    }
}
