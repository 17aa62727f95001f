//! Entity re-exports.

pub use super::bolsa::Entity as Bolsa;
pub use super::certificates::Entity as Certificates;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::recharges::Entity as Recharges;
