//! Ledger Store contract.
//!
//! The store owns durability and atomicity of the balance plus its entries.
//! Implementations: [`super::InMemoryLedgerStore`] for tests and development,
//! and the PostgreSQL repository in `bolsa-db`.

use async_trait::async_trait;

use super::error::LedgerError;
use super::types::{Balance, EntryDraft, EntryFilter, LedgerEntry};

/// Durable home of the singleton balance and its append-only ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Returns the current balance, creating the zero balance on first access.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the store is unreachable.
    async fn read_balance(&self) -> Result<Balance, LedgerError>;

    /// Atomically appends `draft` and updates the balance.
    ///
    /// Succeeds only if the balance version still equals `expected_version`.
    /// Either both the entry and the new balance become visible, or neither.
    ///
    /// # Errors
    ///
    /// - `ConcurrencyConflict` if the version moved
    /// - `InsufficientFunds` / `Overflow` if the draft cannot be applied
    /// - `DuplicateReference` if the reference was already accounted for
    /// - `StorageFailure` if the commit failed; nothing was applied
    async fn append(
        &self,
        draft: EntryDraft,
        expected_version: i64,
    ) -> Result<LedgerEntry, LedgerError>;

    /// Lists entries matching `filter` in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the store is unreachable.
    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, LedgerError>;
}
