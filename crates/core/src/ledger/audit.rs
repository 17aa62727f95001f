//! Replay and reconciliation of the ledger.
//!
//! The balance must always equal the sum of the recorded entries. These
//! functions replay a full entry history to prove it, and total the history
//! for reporting.

use bolsa_shared::{Money, MoneyError};
use serde::Serialize;
use thiserror::Error;

use super::types::{Balance, EntryKind, LedgerEntry, ReferenceKind};

/// First inconsistency found while replaying the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainViolation {
    /// Entry versions are not 1, 2, 3, ...
    #[error("Entry versions are not consecutive: expected {expected}, found {found}")]
    VersionGap {
        /// Version the replay expected next.
        expected: i64,
        /// Version actually recorded.
        found: i64,
    },

    /// An entry's resulting balance does not follow from its predecessor.
    #[error("Entry {version} breaks the balance chain: expected {expected}, recorded {recorded}")]
    BrokenChain {
        /// Version of the offending entry.
        version: i64,
        /// Balance the replay computed.
        expected: Money,
        /// Balance the entry recorded.
        recorded: Money,
    },

    /// An entry left the balance negative.
    #[error("Entry {version} leaves a negative balance: {balance}")]
    NegativeBalance {
        /// Version of the offending entry.
        version: i64,
        /// The negative balance.
        balance: Money,
    },

    /// An entry's amount sign does not fit its kind.
    #[error("Entry {version} has amount {amount} inconsistent with kind {kind}")]
    SignMismatch {
        /// Version of the offending entry.
        version: i64,
        /// Kind of the entry.
        kind: EntryKind,
        /// Recorded amount.
        amount: Money,
    },

    /// The running sum left the representable range.
    #[error("Replaying the ledger overflowed at entry {version}")]
    Overflow {
        /// Version of the offending entry.
        version: i64,
    },
}

/// Replays a complete entry history, oldest first.
///
/// Returns the balance the history adds up to.
///
/// # Errors
///
/// Returns the first [`ChainViolation`] encountered.
pub fn verify_chain(entries: &[LedgerEntry]) -> Result<Money, ChainViolation> {
    let mut running = Money::ZERO;

    for (expected_version, entry) in (1_i64..).zip(entries) {
        if entry.version != expected_version {
            return Err(ChainViolation::VersionGap {
                expected: expected_version,
                found: entry.version,
            });
        }
        if !entry.kind.accepts(entry.amount) {
            return Err(ChainViolation::SignMismatch {
                version: entry.version,
                kind: entry.kind,
                amount: entry.amount,
            });
        }

        running = running
            .checked_add(entry.amount)
            .map_err(|_| ChainViolation::Overflow {
                version: entry.version,
            })?;

        if running != entry.resulting_balance {
            return Err(ChainViolation::BrokenChain {
                version: entry.version,
                expected: running,
                recorded: entry.resulting_balance,
            });
        }
        if running.is_negative() {
            return Err(ChainViolation::NegativeBalance {
                version: entry.version,
                balance: running,
            });
        }
    }

    Ok(running)
}

/// Comparison of the stored balance with the replayed ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Amount held by the balance aggregate.
    pub stored_balance: Money,
    /// Version held by the balance aggregate.
    pub stored_version: i64,
    /// Sum of the entries up to `stored_version`.
    pub replayed_balance: Money,
    /// Entries replayed.
    pub entry_count: i64,
    /// True when the stored balance and version match the replay.
    pub consistent: bool,
}

/// Reconciles `balance` against the entry history.
///
/// Entries newer than `balance.version` are ignored, so a history read after
/// the balance can be passed even while writers are active.
///
/// # Errors
///
/// Returns a [`ChainViolation`] if the history itself is corrupt.
pub fn reconcile(balance: &Balance, entries: &[LedgerEntry]) -> Result<Reconciliation, ChainViolation> {
    let visible: Vec<LedgerEntry> = entries
        .iter()
        .filter(|e| e.version <= balance.version)
        .cloned()
        .collect();
    let replayed_balance = verify_chain(&visible)?;
    let entry_count = i64::try_from(visible.len()).unwrap_or(i64::MAX);

    Ok(Reconciliation {
        stored_balance: balance.amount,
        stored_version: balance.version,
        replayed_balance,
        entry_count,
        consistent: replayed_balance == balance.amount && entry_count == balance.version,
    })
}

/// Totals of a ledger history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    /// Sum of all CREDIT entries.
    pub total_credits: Money,
    /// Sum of all DEBIT entries, as a positive amount.
    pub total_debits: Money,
    /// Net sum of all ADJUSTMENT entries.
    pub net_adjustments: Money,
    /// Recharges credited.
    pub recharges: u64,
    /// Issuances debited, minus issuances compensated.
    pub issuances: u64,
    /// Corrections that moved the balance.
    pub corrections: u64,
}

/// Totals `entries` for reporting.
///
/// # Errors
///
/// Returns `MoneyError::Overflow` if a total leaves the representable range.
pub fn summarize(entries: &[LedgerEntry]) -> Result<LedgerSummary, MoneyError> {
    let mut summary = LedgerSummary::default();
    let mut compensated: u64 = 0;

    for entry in entries {
        match (entry.kind, entry.reference.kind) {
            (EntryKind::Credit, ReferenceKind::Recharge) => {
                summary.recharges += 1;
            }
            (EntryKind::Credit, ReferenceKind::Issuance) => {
                compensated += 1;
            }
            (EntryKind::Debit, ReferenceKind::Issuance) => {
                summary.issuances += 1;
            }
            (EntryKind::Adjustment, ReferenceKind::Correction) => {
                summary.corrections += 1;
            }
            _ => {}
        }

        match entry.kind {
            EntryKind::Credit => {
                summary.total_credits = summary.total_credits.checked_add(entry.amount)?;
            }
            EntryKind::Debit => {
                summary.total_debits = summary.total_debits.checked_sub(entry.amount)?;
            }
            EntryKind::Adjustment => {
                summary.net_adjustments = summary.net_adjustments.checked_add(entry.amount)?;
            }
        }
    }

    summary.issuances = summary.issuances.saturating_sub(compensated);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use bolsa_shared::{ActorId, CertificateId, LedgerEntryId, RechargeId};
    use chrono::Utc;

    use super::*;
    use crate::ledger::types::Reference;

    fn entry(version: i64, kind: EntryKind, amount: i64, resulting: i64, reference: Reference) -> LedgerEntry {
        LedgerEntry {
            id: LedgerEntryId::new(),
            kind,
            amount: Money::new(amount),
            reference,
            resulting_balance: Money::new(resulting),
            version,
            actor_id: ActorId::new("admin").unwrap(),
            created_at: Utc::now(),
        }
    }

    /// Recharge 1,000,000; issue a 286,200 certificate; correct it up by 87,100.
    fn scenario() -> Vec<LedgerEntry> {
        let certificate = CertificateId::new();
        vec![
            entry(1, EntryKind::Credit, 1_000_000, 1_000_000, Reference::recharge(RechargeId::new())),
            entry(2, EntryKind::Debit, -286_200, 713_800, Reference::issuance(certificate)),
            entry(3, EntryKind::Adjustment, -87_100, 626_700, Reference::correction(certificate)),
        ]
    }

    #[test]
    fn test_verify_chain_replays_scenario() {
        assert_eq!(verify_chain(&scenario()), Ok(Money::new(626_700)));
        assert_eq!(verify_chain(&[]), Ok(Money::ZERO));
    }

    #[test]
    fn test_verify_chain_detects_broken_link() {
        let mut entries = scenario();
        entries[1].resulting_balance = Money::new(700_000);
        assert_eq!(
            verify_chain(&entries),
            Err(ChainViolation::BrokenChain {
                version: 2,
                expected: Money::new(713_800),
                recorded: Money::new(700_000),
            })
        );
    }

    #[test]
    fn test_verify_chain_detects_version_gap() {
        let mut entries = scenario();
        entries.remove(1);
        assert!(matches!(
            verify_chain(&entries),
            Err(ChainViolation::VersionGap { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn test_verify_chain_detects_sign_mismatch() {
        let entries = vec![entry(
            1,
            EntryKind::Debit,
            500,
            500,
            Reference::issuance(CertificateId::new()),
        )];
        assert!(matches!(
            verify_chain(&entries),
            Err(ChainViolation::SignMismatch { version: 1, .. })
        ));
    }

    #[test]
    fn test_verify_chain_detects_negative_balance() {
        let entries = vec![entry(
            1,
            EntryKind::Adjustment,
            -10,
            -10,
            Reference::correction(CertificateId::new()),
        )];
        assert!(matches!(
            verify_chain(&entries),
            Err(ChainViolation::NegativeBalance { version: 1, .. })
        ));
    }

    #[test]
    fn test_reconcile_consistent_balance() {
        let balance = Balance {
            amount: Money::new(626_700),
            version: 3,
            updated_at: Utc::now(),
        };
        let report = reconcile(&balance, &scenario()).unwrap();
        assert!(report.consistent);
        assert_eq!(report.entry_count, 3);
    }

    #[test]
    fn test_reconcile_ignores_entries_newer_than_balance() {
        let balance = Balance {
            amount: Money::new(713_800),
            version: 2,
            updated_at: Utc::now(),
        };
        let report = reconcile(&balance, &scenario()).unwrap();
        assert!(report.consistent);
        assert_eq!(report.replayed_balance, Money::new(713_800));
    }

    #[test]
    fn test_reconcile_flags_drift() {
        let balance = Balance {
            amount: Money::new(700_000),
            version: 3,
            updated_at: Utc::now(),
        };
        let report = reconcile(&balance, &scenario()).unwrap();
        assert!(!report.consistent);
        assert_eq!(report.replayed_balance, Money::new(626_700));
    }

    #[test]
    fn test_summarize_nets_compensated_issuances() {
        let mut entries = scenario();
        let failed = CertificateId::new();
        entries.push(entry(4, EntryKind::Debit, -373_300, 253_400, Reference::issuance(failed)));
        entries.push(entry(5, EntryKind::Credit, 373_300, 626_700, Reference::issuance(failed)));

        let summary = summarize(&entries).unwrap();
        assert_eq!(summary.total_credits, Money::new(1_373_300));
        assert_eq!(summary.total_debits, Money::new(659_500));
        assert_eq!(summary.net_adjustments, Money::new(-87_100));
        assert_eq!(summary.recharges, 1);
        assert_eq!(summary.issuances, 1);
        assert_eq!(summary.corrections, 1);
    }
}
