//! `SeaORM` active enums mirroring the PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use bolsa_core::ledger;
use bolsa_core::tariff::Tier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_kind")]
pub enum EntryKind {
    #[sea_orm(string_value = "credit")]
    Credit,
    #[sea_orm(string_value = "debit")]
    Debit,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reference_kind")]
pub enum ReferenceKind {
    #[sea_orm(string_value = "recharge")]
    Recharge,
    #[sea_orm(string_value = "issuance")]
    Issuance,
    #[sea_orm(string_value = "correction")]
    Correction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "vehicle_tier")]
pub enum VehicleTier {
    #[sea_orm(string_value = "low_displacement")]
    LowDisplacement,
    #[sea_orm(string_value = "mid_displacement")]
    MidDisplacement,
}

impl From<ledger::EntryKind> for EntryKind {
    fn from(kind: ledger::EntryKind) -> Self {
        match kind {
            ledger::EntryKind::Credit => Self::Credit,
            ledger::EntryKind::Debit => Self::Debit,
            ledger::EntryKind::Adjustment => Self::Adjustment,
        }
    }
}

impl From<EntryKind> for ledger::EntryKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Credit => Self::Credit,
            EntryKind::Debit => Self::Debit,
            EntryKind::Adjustment => Self::Adjustment,
        }
    }
}

impl From<ledger::ReferenceKind> for ReferenceKind {
    fn from(kind: ledger::ReferenceKind) -> Self {
        match kind {
            ledger::ReferenceKind::Recharge => Self::Recharge,
            ledger::ReferenceKind::Issuance => Self::Issuance,
            ledger::ReferenceKind::Correction => Self::Correction,
        }
    }
}

impl From<ReferenceKind> for ledger::ReferenceKind {
    fn from(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Recharge => Self::Recharge,
            ReferenceKind::Issuance => Self::Issuance,
            ReferenceKind::Correction => Self::Correction,
        }
    }
}

impl From<Tier> for VehicleTier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::LowDisplacement => Self::LowDisplacement,
            Tier::MidDisplacement => Self::MidDisplacement,
        }
    }
}

impl From<VehicleTier> for Tier {
    fn from(tier: VehicleTier) -> Self {
        match tier {
            VehicleTier::LowDisplacement => Self::LowDisplacement,
            VehicleTier::MidDisplacement => Self::MidDisplacement,
        }
    }
}
