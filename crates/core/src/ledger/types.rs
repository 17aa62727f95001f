//! Domain types for the balance ledger.
//!
//! The balance is a singleton aggregate; ledger entries are immutable facts
//! appended against it. Entries are never edited: corrections and
//! compensations are new entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bolsa_shared::{ActorId, CertificateId, LedgerEntryId, Money, RechargeId};

use super::error::LedgerError;

/// Kind of movement recorded by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Increases the balance (recharges, issuance compensations).
    Credit,
    /// Decreases the balance (certificate issuance).
    Debit,
    /// Signed correction of a previously issued certificate.
    Adjustment,
}

impl EntryKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Adjustment => "adjustment",
        }
    }

    /// Returns true if `amount` has the sign this kind requires.
    ///
    /// Credits are positive, debits negative, adjustments non-zero.
    #[must_use]
    pub const fn accepts(self, amount: Money) -> bool {
        match self {
            Self::Credit => amount.is_positive(),
            Self::Debit => amount.is_negative(),
            Self::Adjustment => !amount.is_zero(),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "adjustment" => Ok(Self::Adjustment),
            _ => Err(format!("Unknown entry kind: {s}")),
        }
    }
}

/// What caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// A recharge of the fund.
    Recharge,
    /// Issuance of a certificate.
    Issuance,
    /// Tier correction of an issued certificate.
    Correction,
}

impl ReferenceKind {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recharge => "recharge",
            Self::Issuance => "issuance",
            Self::Correction => "correction",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recharge" => Ok(Self::Recharge),
            "issuance" => Ok(Self::Issuance),
            "correction" => Ok(Self::Correction),
            _ => Err(format!("Unknown reference kind: {s}")),
        }
    }
}

/// Causal reference of a ledger entry: the recharge or certificate behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Kind of the referenced operation.
    pub kind: ReferenceKind,
    /// ID of the recharge or certificate.
    pub id: Uuid,
}

impl Reference {
    /// Reference to a recharge.
    #[must_use]
    pub const fn recharge(id: RechargeId) -> Self {
        Self {
            kind: ReferenceKind::Recharge,
            id: id.into_inner(),
        }
    }

    /// Reference to a certificate issuance.
    #[must_use]
    pub const fn issuance(id: CertificateId) -> Self {
        Self {
            kind: ReferenceKind::Issuance,
            id: id.into_inner(),
        }
    }

    /// Reference to a certificate tier correction.
    #[must_use]
    pub const fn correction(id: CertificateId) -> Self {
        Self {
            kind: ReferenceKind::Correction,
            id: id.into_inner(),
        }
    }

    /// Whether at most one entry of a given kind may carry this reference.
    ///
    /// A certificate can be corrected any number of times; recharges and
    /// issuances are accounted exactly once per entry kind.
    #[must_use]
    pub const fn is_unique_per_kind(&self) -> bool {
        !matches!(self.kind, ReferenceKind::Correction)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Snapshot of the singleton balance aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Current amount; never negative.
    pub amount: Money,
    /// Bumped by exactly one on every appended entry.
    pub version: i64,
    /// Time of the last change.
    pub updated_at: DateTime<Utc>,
}

impl Balance {
    /// The zero balance created on first access.
    #[must_use]
    pub const fn opening(now: DateTime<Utc>) -> Self {
        Self {
            amount: Money::ZERO,
            version: 0,
            updated_at: now,
        }
    }

    /// Computes the balance after applying `delta`.
    ///
    /// # Errors
    ///
    /// - `Overflow` if the sum is not representable
    /// - `InsufficientFunds` if the result would be negative
    pub fn project(&self, delta: Money) -> Result<Money, LedgerError> {
        let next = self.amount.checked_add(delta)?;
        if next.is_negative() {
            return Err(LedgerError::InsufficientFunds {
                available: self.amount,
                required: delta.checked_neg()?,
            });
        }
        Ok(next)
    }
}

/// An entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    /// Kind of movement.
    pub kind: EntryKind,
    /// Signed amount applied to the balance.
    pub amount: Money,
    /// Causal reference.
    pub reference: Reference,
    /// Who authorized the movement.
    pub actor_id: ActorId,
}

impl EntryDraft {
    /// Builds a draft, checking that the amount sign matches the kind.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` when the sign does not match `kind`.
    pub fn new(
        kind: EntryKind,
        amount: Money,
        reference: Reference,
        actor_id: ActorId,
    ) -> Result<Self, LedgerError> {
        if !kind.accepts(amount) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(Self {
            kind,
            amount,
            reference,
            actor_id,
        })
    }
}

/// A persisted, immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// Kind of movement.
    pub kind: EntryKind,
    /// Signed amount: positive credits, negative debits.
    pub amount: Money,
    /// Causal reference.
    pub reference: Reference,
    /// Balance immediately after applying this entry.
    pub resulting_balance: Money,
    /// Balance version produced by this entry; also its position in the ledger.
    pub version: i64,
    /// Who authorized the movement.
    pub actor_id: ActorId,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Materializes a draft applied on top of `previous` balance.
    ///
    /// # Errors
    ///
    /// Propagates `Overflow` and `InsufficientFunds` from [`Balance::project`].
    pub fn from_draft(
        draft: EntryDraft,
        previous: &Balance,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        let resulting_balance = previous.project(draft.amount)?;
        Ok(Self {
            id: LedgerEntryId::new(),
            kind: draft.kind,
            amount: draft.amount,
            reference: draft.reference,
            resulting_balance,
            version: previous.version + 1,
            actor_id: draft.actor_id,
            created_at,
        })
    }

    /// Balance immediately before this entry.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` for corrupted entries whose difference is not representable.
    pub fn previous_balance(&self) -> Result<Money, LedgerError> {
        Ok(self.resulting_balance.checked_sub(self.amount)?)
    }
}

/// Outcome of a successful balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Posting {
    /// The appended entry.
    pub entry: LedgerEntry,
    /// Balance before the entry was applied.
    pub previous_balance: Money,
}

impl Posting {
    /// Balance after the entry was applied.
    #[must_use]
    pub const fn new_balance(&self) -> Money {
        self.entry.resulting_balance
    }
}

/// Read filter for listing ledger entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries with this reference kind.
    pub reference_kind: Option<ReferenceKind>,
    /// Only entries referencing this recharge or certificate.
    pub reference_id: Option<Uuid>,
    /// Only entries created at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// Returns true if `entry` passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.reference_kind
            .is_none_or(|kind| entry.reference.kind == kind)
            && self.reference_id.is_none_or(|id| entry.reference.id == id)
            && self.since.is_none_or(|since| entry.created_at >= since)
    }
}
