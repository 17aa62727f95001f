//! Core business logic for the bolsa fund.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Storage is reached through the [`ledger::LedgerStore`] and registry traits.
//!
//! # Modules
//!
//! - `ledger` - Balance, entries, store contract and the Balance Engine
//! - `tariff` - Tier to tariff resolution
//! - `correction` - Tier correction deltas
//! - `fund` - The service interface and its recharge/certificate workflows

pub mod correction;
pub mod fund;
pub mod ledger;
pub mod tariff;
