//! Order and cart totals.

use common::Money;
use serde::Serialize;

/// Charges applied on top of the item subtotal.
///
/// Delivery fees and discounts are not priced yet, so [`Charges::default`]
/// is all zeros. Callers go through this type so a pricing rule can be
/// introduced in one place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Charges {
    pub delivery_fee: Money,
    pub discount_amount: Money,
}

impl Charges {
    /// Applies the charges to a subtotal.
    pub fn apply(&self, subtotal: Money) -> Totals {
        Totals {
            subtotal,
            delivery_fee: self.delivery_fee,
            discount_amount: self.discount_amount,
            total_amount: subtotal + self.delivery_fee - self.discount_amount,
        }
    }
}

/// The four money fields shared by cart summaries and orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

/// Sums `unit_price * quantity` over a set of lines.
pub fn subtotal<I>(lines: I) -> Money
where
    I: IntoIterator<Item = (Money, u32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| price.multiply(quantity))
        .sum()
}

/// Like [`subtotal`], but `None` if any product or the running sum overflows.
pub fn checked_subtotal<I>(lines: I) -> Option<Money>
where
    I: IntoIterator<Item = (Money, u32)>,
{
    lines
        .into_iter()
        .try_fold(Money::zero(), |acc, (price, quantity)| {
            acc.checked_add(price.checked_multiply(quantity)?)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_charges_leave_subtotal_unchanged() {
        let totals = Charges::default().apply(Money::from_cents(2_500));
        assert_eq!(totals.total_amount, Money::from_cents(2_500));
        assert!(totals.delivery_fee.is_zero());
        assert!(totals.discount_amount.is_zero());
    }

    #[test]
    fn total_balances_fee_and_discount() {
        let charges = Charges {
            delivery_fee: Money::from_cents(4_000),
            discount_amount: Money::from_cents(1_050),
        };
        let totals = charges.apply(Money::from_cents(19_999));
        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.delivery_fee - totals.discount_amount
        );
        assert_eq!(totals.total_amount, Money::from_cents(22_949));
    }

    #[test]
    fn subtotal_is_exact_for_cent_prices() {
        // 0.10 * 3 must not drift the way binary floats do.
        let lines = vec![(Money::from_cents(10), 3), (Money::from_cents(1_999), 2)];
        assert_eq!(subtotal(lines), Money::from_cents(4_028));
    }

    #[test]
    fn subtotal_of_nothing_is_zero() {
        assert!(subtotal(Vec::new()).is_zero());
    }

    #[test]
    fn checked_subtotal_matches_and_detects_overflow() {
        let lines = vec![(Money::from_cents(10), 3), (Money::from_cents(1_999), 2)];
        assert_eq!(checked_subtotal(lines.clone()), Some(subtotal(lines)));

        // Largest value a 96-bit decimal mantissa holds.
        let huge: Money = "79228162514264337593543950335".parse().unwrap();
        assert_eq!(checked_subtotal(vec![(huge, 2)]), None);
        assert_eq!(checked_subtotal(vec![(huge, 1), (huge, 1)]), None);
    }
}
