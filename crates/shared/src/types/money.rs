//! Integer money type for the bolsa ledger.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are whole units of the smallest currency unit (pesos). There is no
//! currency field: the ledger holds a single fund in a single currency.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by money arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// The result does not fit in the representable range.
    #[error("Amount arithmetic overflowed the representable range")]
    Overflow,
}

/// A signed monetary amount in the smallest currency unit.
///
/// Arithmetic is checked: any operation that would leave the `i64` range
/// returns [`MoneyError::Overflow`] instead of wrapping or saturating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates a new amount.
    #[must_use]
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns the raw integer amount.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the sum is not representable.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0.checked_add(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Subtracts `other` from `self`.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` if the difference is not representable.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MoneyError::Overflow)
    }

    /// Negates the amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Overflow` for `i64::MIN`, which has no positive counterpart.
    pub fn checked_neg(self) -> Result<Self, MoneyError> {
        self.0.checked_neg().map(Self).ok_or(MoneyError::Overflow)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_new() {
        let money = Money::new(286_200);
        assert_eq!(money.amount(), 286_200);
        assert_eq!(i64::from(money), 286_200);
    }

    #[test]
    fn test_money_zero() {
        assert!(Money::ZERO.is_zero());
        assert_eq!(Money::default(), Money::ZERO);
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::ZERO.is_positive());
    }

    #[test]
    fn test_money_sign() {
        assert!(Money::new(10).is_positive());
        assert!(Money::new(-10).is_negative());
    }

    #[test]
    fn test_checked_add_and_sub() {
        let a = Money::new(1_000_000);
        let b = Money::new(286_200);
        assert_eq!(a.checked_sub(b), Ok(Money::new(713_800)));
        assert_eq!(a.checked_add(b), Ok(Money::new(1_286_200)));
    }

    #[test]
    fn test_checked_add_overflow() {
        let max = Money::new(i64::MAX);
        assert_eq!(max.checked_add(Money::new(1)), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_checked_sub_overflow() {
        let min = Money::new(i64::MIN);
        assert_eq!(min.checked_sub(Money::new(1)), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_checked_neg() {
        assert_eq!(Money::new(87_100).checked_neg(), Ok(Money::new(-87_100)));
        assert_eq!(Money::new(i64::MIN).checked_neg(), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Money::new(373_300)).unwrap();
        assert_eq!(json, "373300");
        let back: Money = serde_json::from_str("373300").unwrap();
        assert_eq!(back, Money::new(373_300));
    }
}
