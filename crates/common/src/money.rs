//! Exact two-decimal currency amounts.

use std::iter::Sum;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A currency amount held as a decimal with exactly two fractional digits.
///
/// Every constructor rounds half away from zero to two places, so sums and
/// products of `Money` never drift the way `f64` arithmetic does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Number of fractional digits kept.
    pub const SCALE: u32 = 2;

    /// Largest amount in minor units that a `NUMERIC(12,2)` column holds.
    pub const MAX_STORED_CENTS: i64 = 999_999_999_999;

    /// Creates an amount, rounding to two decimal places.
    pub fn new(amount: Decimal) -> Self {
        let mut amount =
            amount.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        amount.rescale(Self::SCALE);
        Self(amount)
    }

    /// Creates an amount from minor units (e.g. `2550` is `25.50`).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, Self::SCALE))
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self::from_cents(0)
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a line quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money::new(self.0 * Decimal::from(quantity))
    }

    /// Like [`Money::multiply`], but `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money::new)
    }

    /// `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money::new)
    }

    /// Returns true if the amount fits a `NUMERIC(12,2)` column.
    pub fn fits_storage(&self) -> bool {
        self.0.abs() <= Decimal::new(Self::MAX_STORED_CENTS, Self::SCALE)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self::new)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money::new(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money::new(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_places() {
        let money = Money::new(Decimal::new(10_005, 3));
        assert_eq!(money.to_string(), "10.01");
        assert_eq!(Money::from_str("3").unwrap().to_string(), "3.00");
    }

    #[test]
    fn decimal_sums_do_not_drift() {
        // 0.1 + 0.2 is the classic f64 failure.
        let a = Money::from_str("0.10").unwrap();
        let b = Money::from_str("0.20").unwrap();
        assert_eq!(a + b, Money::from_str("0.30").unwrap());

        let total: Money = std::iter::repeat_n(Money::from_cents(1), 1000).sum();
        assert_eq!(total, Money::from_cents(1000));
    }

    #[test]
    fn multiply_by_quantity() {
        assert_eq!(Money::from_cents(999).multiply(3), Money::from_cents(2997));
        assert_eq!(Money::from_cents(999).multiply(0), Money::zero());
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.checked_multiply(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(
            Money::from_cents(250).checked_multiply(4),
            Some(Money::from_cents(1_000))
        );
        assert_eq!(
            Money::from_cents(1).checked_add(Money::from_cents(2)),
            Some(Money::from_cents(3))
        );
    }

    #[test]
    fn storage_bound_matches_column_precision() {
        assert!(Money::from_cents(Money::MAX_STORED_CENTS).fits_storage());
        assert!(!Money::from_cents(Money::MAX_STORED_CENTS + 1).fits_storage());
        assert!(Money::from_cents(-Money::MAX_STORED_CENTS).fits_storage());
    }

    #[test]
    fn subtraction_and_sign() {
        let diff = Money::from_cents(500) - Money::from_cents(750);
        assert_eq!(diff, Money::from_cents(-250));
        assert!(diff.is_negative());
        assert!(!Money::zero().is_negative());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn serializes_as_json_number() {
        let json = serde_json::to_value(Money::from_cents(2500)).unwrap();
        assert_eq!(json.as_f64(), Some(25.0));

        let parsed: Money = serde_json::from_str("9.99").unwrap();
        assert_eq!(parsed, Money::from_cents(999));

        let rounded: Money = serde_json::from_str("1.005").unwrap();
        assert_eq!(rounded, Money::from_cents(101));
    }
}
