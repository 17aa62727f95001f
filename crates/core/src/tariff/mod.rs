//! Certificate tariffs.
//!
//! Maps a vehicle tier to its base value and commission. Tariff values are
//! configuration inputs; nothing here hardcodes a peso amount.

pub mod resolver;
pub mod tier;

pub use resolver::{Tariff, TariffResolver};
pub use tier::Tier;
