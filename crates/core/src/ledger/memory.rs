//! In-memory Ledger Store.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use super::error::LedgerError;
use super::store::LedgerStore;
use super::types::{Balance, EntryDraft, EntryFilter, LedgerEntry};

#[derive(Debug, Default)]
struct State {
    balance: Option<Balance>,
    entries: Vec<LedgerEntry>,
}

impl State {
    fn balance(&mut self) -> &mut Balance {
        self.balance.get_or_insert_with(|| Balance::opening(Utc::now()))
    }
}

/// In-memory append-only ledger store.
///
/// Intended for tests/dev. Every append is applied under a single write lock,
/// so the version check, the funds check and the push are one atomic step.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::StorageFailure("ledger lock poisoned".to_string())
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn read_balance(&self) -> Result<Balance, LedgerError> {
        if let Some(balance) = self.state.read().map_err(poisoned)?.balance.clone() {
            return Ok(balance);
        }
        Ok(self.state.write().map_err(poisoned)?.balance().clone())
    }

    async fn append(
        &self,
        draft: EntryDraft,
        expected_version: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        let mut state = self.state.write().map_err(poisoned)?;

        let current = state.balance().clone();
        if current.version != expected_version {
            return Err(LedgerError::ConcurrencyConflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        if draft.reference.is_unique_per_kind()
            && state
                .entries
                .iter()
                .any(|e| e.kind == draft.kind && e.reference == draft.reference)
        {
            return Err(LedgerError::DuplicateReference {
                kind: draft.kind,
                reference: draft.reference,
            });
        }

        let now = Utc::now();
        let entry = LedgerEntry::from_draft(draft, &current, now)?;

        *state.balance() = Balance {
            amount: entry.resulting_balance,
            version: entry.version,
            updated_at: now,
        };
        state.entries.push(entry.clone());

        Ok(entry)
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }
}
