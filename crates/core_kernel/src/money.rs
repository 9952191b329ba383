//! Money types with precise decimal arithmetic
//!
//! The clinic bills in a single currency (Indian Rupee), so `Money` is a thin
//! wrapper around `rust_decimal::Decimal` without a currency tag. Amounts keep
//! their full precision through every calculation; rounding to paise happens
//! only through [`Money::rounded`], at the point a total is persisted or shown.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Number of decimal places (paise) used when rounding for persistence
pub const MINOR_UNIT_PLACES: u32 = 2;

/// Currency symbol used for display
pub const CURRENCY_SYMBOL: &str = "₹";

/// A monetary amount in the clinic's local currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value without rounding
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates Money from an integer amount in minor units (paise)
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, MINOR_UNIT_PLACES))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self(dec!(0))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Rounds to paise, midpoint away from zero
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(MINOR_UNIT_PLACES, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }

    /// Multiplies by a scalar (e.g. a quantity)
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    /// Returns `percent`% of this amount, at full precision
    pub fn percent(&self, percent: Decimal) -> Self {
        Self(self.0 * percent / dec!(100))
    }

    /// Splits the amount into two equal halves at full precision
    pub fn halve(&self) -> Self {
        Self(self.0 / dec!(2))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.dp$}",
            CURRENCY_SYMBOL,
            self.rounded().0,
            dp = MINOR_UNIT_PLACES as usize
        )
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        self.multiply(factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_from_minor() {
        let m = Money::from_minor(10050);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00));
        let b = Money::new(dec!(50.00));

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
        assert_eq!((-a).amount(), dec!(-100.00));
    }

    #[test]
    fn test_percent_keeps_full_precision() {
        let m = Money::new(dec!(0.01));
        assert_eq!(m.percent(dec!(5)).amount(), dec!(0.0005));
        assert_eq!(m.percent(dec!(5)).halve().amount(), dec!(0.00025));
    }

    #[test]
    fn test_rounding_midpoint_away_from_zero() {
        assert_eq!(Money::new(dec!(10.125)).rounded().amount(), dec!(10.13));
        assert_eq!(Money::new(dec!(10.135)).rounded().amount(), dec!(10.14));
        assert_eq!(Money::new(dec!(-10.125)).rounded().amount(), dec!(-10.13));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::new(dec!(1234.5)).to_string(), "₹ 1234.50");
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::new(dec!(1)).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::zero().is_negative());
        assert!(Money::new(dec!(-1)).is_negative());
    }
}
