//! Shared types, errors, and configuration for the bolsa ledger.
//!
//! This crate provides common types used across all other crates:
//! - Integer money type with overflow-checked arithmetic
//! - Typed IDs for recharges, certificates and ledger entries
//! - The opaque actor identifier handed over by the auth collaborator
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig, TariffConfig};
pub use error::{AppError, AppResult};
pub use types::{ActorId, CertificateId, LedgerEntryId, Money, MoneyError, RechargeId};
