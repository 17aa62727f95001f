//! Repository abstractions for data access.
//!
//! Repositories implement the storage contracts of `bolsa-core` on top of
//! `SeaORM`, hiding the database details from the fund workflows.

pub mod certificate;
pub mod ledger;
pub mod recharge;

pub use certificate::CertificateRepository;
pub use ledger::LedgerRepository;
pub use recharge::RechargeRepository;
