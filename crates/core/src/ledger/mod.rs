//! Balance ledger.
//!
//! This module implements the fund's accounting core:
//! - Ledger entries and the singleton balance
//! - The Ledger Store contract and an in-memory store
//! - The Balance Engine (credit, debit, adjust with optimistic retries)
//! - Chain verification and reconciliation

pub mod audit;
pub mod engine;
pub mod error;
pub mod memory;
pub mod store;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use audit::{ChainViolation, LedgerSummary, Reconciliation, reconcile, summarize, verify_chain};
pub use engine::{BalanceEngine, RetryPolicy};
pub use error::LedgerError;
pub use memory::InMemoryLedgerStore;
pub use store::LedgerStore;
pub use types::{
    Balance, EntryDraft, EntryFilter, EntryKind, LedgerEntry, Posting, Reference, ReferenceKind,
};
