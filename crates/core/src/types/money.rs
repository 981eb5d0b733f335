//! Exact money amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A money amount in the store currency.
///
/// The backend reports prices as JSON numbers; they deserialize exactly into
/// a [`Decimal`] so totals never accumulate binary floating point error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a money amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a money amount from whole currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Create a money amount from minor units (e.g. cents).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a percentage (e.g. `10` for ten percent).
    #[must_use]
    pub fn percent(&self, percent: u32) -> Self {
        Self(self.0 * Decimal::from(percent) / Decimal::ONE_HUNDRED)
    }

    /// Round half away from zero to two decimal places.
    #[must_use]
    pub fn round_to_cents(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.round_to_cents().0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_json_numbers_exactly() {
        let m: Money = serde_json::from_str("499.99").unwrap();
        assert_eq!(m, Money::from_minor(49_999));
        let m: Money = serde_json::from_str("500").unwrap();
        assert_eq!(m, Money::from_units(500));
    }

    #[test]
    fn test_deserializes_string_amounts() {
        let m: Money = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(m, Money::from_minor(1250));
    }

    #[test]
    fn test_percent() {
        assert_eq!(Money::from_units(1500).percent(10), Money::from_units(150));
        assert_eq!(Money::from_minor(999).percent(10), Money::new(Decimal::new(999, 3)));
    }

    #[test]
    fn test_sum_and_mul() {
        let total: Money = [Money::from_units(500) * 3, Money::from_minor(250)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_minor(150_250));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_units(1650).to_string(), "$1650.00");
        assert_eq!(Money::new(Decimal::new(9_995, 4)).to_string(), "$1.00");
    }
}
