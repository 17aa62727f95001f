//! Vehicle tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ledger::LedgerError;

/// Motorcycle displacement tier that determines the certificate tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Up to 99cc.
    #[serde(alias = "hasta_99cc", alias = "low")]
    LowDisplacement,
    /// From 100cc to 200cc.
    #[serde(alias = "100_200cc", alias = "mid")]
    MidDisplacement,
}

impl Tier {
    /// All tiers, lowest first.
    pub const ALL: [Self; 2] = [Self::LowDisplacement, Self::MidDisplacement];

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LowDisplacement => "low_displacement",
            Self::MidDisplacement => "mid_displacement",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low_displacement" | "hasta_99cc" | "low" => Ok(Self::LowDisplacement),
            "mid_displacement" | "100_200cc" | "mid" => Ok(Self::MidDisplacement),
            _ => Err(LedgerError::InvalidTier(s.to_string())),
        }
    }
}
