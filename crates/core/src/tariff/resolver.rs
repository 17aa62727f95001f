//! Tariff resolution.

use std::collections::BTreeMap;

use bolsa_shared::{Money, TariffConfig};
use serde::Serialize;

use super::tier::Tier;
use crate::ledger::LedgerError;

/// Cost of a certificate of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tariff {
    /// Premium paid to the insurer.
    pub base_value: Money,
    /// Fixed fee kept by the agency.
    pub commission: Money,
    total: Money,
}

impl Tariff {
    /// Creates a tariff.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` unless `base_value > 0` and `commission >= 0`
    /// - `Overflow` if the total is not representable
    pub fn new(base_value: Money, commission: Money) -> Result<Self, LedgerError> {
        if !base_value.is_positive() {
            return Err(LedgerError::InvalidAmount(base_value));
        }
        if commission.is_negative() {
            return Err(LedgerError::InvalidAmount(commission));
        }
        let total = base_value.checked_add(commission)?;
        Ok(Self {
            base_value,
            commission,
            total,
        })
    }

    /// Amount debited from the fund for one certificate.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }
}

/// Pure lookup from tier to tariff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TariffResolver {
    tariffs: BTreeMap<Tier, Tariff>,
}

impl TariffResolver {
    /// Creates a resolver from explicit tariffs.
    pub fn new(tariffs: impl IntoIterator<Item = (Tier, Tariff)>) -> Self {
        Self {
            tariffs: tariffs.into_iter().collect(),
        }
    }

    /// Builds the resolver from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` or `Overflow` for unusable configured values.
    pub fn from_config(config: &TariffConfig) -> Result<Self, LedgerError> {
        let commission = Money::new(config.commission);
        Ok(Self::new([
            (
                Tier::LowDisplacement,
                Tariff::new(Money::new(config.low_displacement_base), commission)?,
            ),
            (
                Tier::MidDisplacement,
                Tariff::new(Money::new(config.mid_displacement_base), commission)?,
            ),
        ]))
    }

    /// Tariff of `tier`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTier` if no tariff is configured for it.
    pub fn resolve(&self, tier: Tier) -> Result<Tariff, LedgerError> {
        self.tariffs
            .get(&tier)
            .copied()
            .ok_or_else(|| LedgerError::InvalidTier(tier.to_string()))
    }

    /// Configured tiers with their tariffs, lowest tier first.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, Tariff)> + '_ {
        self.tariffs.iter().map(|(tier, tariff)| (*tier, *tariff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn resolver() -> TariffResolver {
        TariffResolver::from_config(&TariffConfig::default()).unwrap()
    }

    #[rstest]
    #[case(Tier::LowDisplacement, 256_200, 286_200)]
    #[case(Tier::MidDisplacement, 343_300, 373_300)]
    fn test_default_tariffs(#[case] tier: Tier, #[case] base: i64, #[case] total: i64) {
        let tariff = resolver().resolve(tier).unwrap();
        assert_eq!(tariff.base_value, Money::new(base));
        assert_eq!(tariff.commission, Money::new(30_000));
        assert_eq!(tariff.total(), Money::new(total));
    }

    #[test]
    fn test_unconfigured_tier_is_invalid() {
        let tariff = Tariff::new(Money::new(100), Money::ZERO).unwrap();
        let resolver = TariffResolver::new([(Tier::LowDisplacement, tariff)]);
        assert_eq!(
            resolver.resolve(Tier::MidDisplacement),
            Err(LedgerError::InvalidTier("mid_displacement".to_string()))
        );
    }

    #[rstest]
    #[case(0, 30_000)]
    #[case(-1, 30_000)]
    #[case(256_200, -1)]
    fn test_invalid_tariff_values(#[case] base: i64, #[case] commission: i64) {
        assert!(matches!(
            Tariff::new(Money::new(base), Money::new(commission)),
            Err(LedgerError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_configured_tariffs_are_used() {
        let config = TariffConfig {
            low_displacement_base: 100_000,
            mid_displacement_base: 200_000,
            commission: 5_000,
        };
        let resolver = TariffResolver::from_config(&config).unwrap();
        let totals: Vec<Money> = resolver.iter().map(|(_, t)| t.total()).collect();
        assert_eq!(totals, vec![Money::new(105_000), Money::new(205_000)]);
    }
}
