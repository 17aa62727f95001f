//! `SeaORM` entities.

pub mod prelude;

pub mod bolsa;
pub mod certificates;
pub mod ledger_entries;
pub mod recharges;
pub mod sea_orm_active_enums;
