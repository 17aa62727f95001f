//! Correction Calculator.
//!
//! When an issued certificate turns out to be of another tier, its cost is
//! recomputed and the fund is adjusted by the difference. A cost increase
//! takes money out of the fund, a decrease gives it back. An unchanged cost
//! appends nothing.

use bolsa_shared::{ActorId, CertificateId, Money};
use serde::Serialize;
use tracing::info;

use crate::ledger::{BalanceEngine, LedgerError, Posting, Reference};
use crate::tariff::{Tariff, TariffResolver, Tier};

/// Cost difference of moving a certificate to a new tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorrectionPlan {
    /// Total charged when the certificate was issued (or last corrected).
    pub prior_total: Money,
    /// Tier the certificate moves to.
    pub new_tier: Tier,
    /// Tariff of the new tier.
    pub new_tariff: Tariff,
    /// `new_total - prior_total`; positive when the certificate got dearer.
    pub delta: Money,
}

impl CorrectionPlan {
    /// True when the new cost equals the prior one.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.delta.is_zero()
    }

    /// Signed amount applied to the fund balance: the negated cost delta.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the delta cannot be negated.
    pub fn balance_adjustment(&self) -> Result<Money, LedgerError> {
        Ok(self.delta.checked_neg()?)
    }
}

/// Result of a tier correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrectionOutcome {
    /// The computed plan.
    pub plan: CorrectionPlan,
    /// The ADJUSTMENT entry, absent for a no-op correction.
    pub posting: Option<Posting>,
    /// Fund balance after the correction.
    pub new_balance: Money,
}

impl CorrectionOutcome {
    /// Cost delta of the correction.
    #[must_use]
    pub const fn delta(&self) -> Money {
        self.plan.delta
    }
}

/// Computes and applies tier corrections.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionCalculator<'a> {
    resolver: &'a TariffResolver,
}

impl<'a> CorrectionCalculator<'a> {
    /// Creates a calculator over `resolver`.
    #[must_use]
    pub const fn new(resolver: &'a TariffResolver) -> Self {
        Self { resolver }
    }

    /// Computes the cost delta without touching the fund.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `prior_total` is not positive
    /// - `InvalidTier` if `new_tier` has no tariff
    /// - `Overflow` if the delta is not representable
    pub fn plan(&self, prior_total: Money, new_tier: Tier) -> Result<CorrectionPlan, LedgerError> {
        if !prior_total.is_positive() {
            return Err(LedgerError::InvalidAmount(prior_total));
        }
        let new_tariff = self.resolver.resolve(new_tier)?;
        let delta = new_tariff.total().checked_sub(prior_total)?;

        Ok(CorrectionPlan {
            prior_total,
            new_tier,
            new_tariff,
            delta,
        })
    }

    /// Computes the delta and, unless it is zero, adjusts the fund by it.
    ///
    /// # Errors
    ///
    /// Any error of [`Self::plan`]; `InsufficientFunds` when a cost increase
    /// cannot be covered; plus engine errors.
    pub async fn apply(
        &self,
        engine: &BalanceEngine,
        certificate_id: CertificateId,
        prior_total: Money,
        new_tier: Tier,
        actor: ActorId,
    ) -> Result<CorrectionOutcome, LedgerError> {
        let plan = self.plan(prior_total, new_tier)?;

        if plan.is_noop() {
            let balance = engine.balance().await?;
            return Ok(CorrectionOutcome {
                plan,
                posting: None,
                new_balance: balance.amount,
            });
        }

        let posting = engine
            .adjust(
                plan.balance_adjustment()?,
                Reference::correction(certificate_id),
                actor,
            )
            .await?;

        info!(
            certificate_id = %certificate_id,
            new_tier = %new_tier,
            delta = %plan.delta,
            new_balance = %posting.new_balance(),
            "certificate tier corrected"
        );

        Ok(CorrectionOutcome {
            plan,
            new_balance: posting.new_balance(),
            posting: Some(posting),
        })
    }
}
