//! GST calculation
//!
//! Intra-state supplies split the tax evenly into CGST and SGST; inter-state
//! supplies carry it entirely as IGST. Components are kept at full precision
//! and only rounded through [`GstBreakdown::rounded`].

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::error::BillingError;

/// GST slab applied to a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GstRate {
    Exempt,
    Five,
    Twelve,
    Eighteen,
    TwentyEight,
}

impl GstRate {
    pub const ALL: [GstRate; 5] = [
        GstRate::Exempt,
        GstRate::Five,
        GstRate::Twelve,
        GstRate::Eighteen,
        GstRate::TwentyEight,
    ];

    /// Rate as a whole percentage
    pub fn percent(&self) -> u8 {
        match self {
            GstRate::Exempt => 0,
            GstRate::Five => 5,
            GstRate::Twelve => 12,
            GstRate::Eighteen => 18,
            GstRate::TwentyEight => 28,
        }
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.percent())
    }

    pub fn from_percent(percent: u8) -> Result<Self, BillingError> {
        GstRate::ALL
            .into_iter()
            .find(|rate| rate.percent() == percent)
            .ok_or_else(|| {
                BillingError::validation(format!(
                    "GST rate must be one of 0, 5, 12, 18, 28 (got {percent})"
                ))
            })
    }
}

impl TryFrom<u8> for GstRate {
    type Error = BillingError;

    fn try_from(percent: u8) -> Result<Self, Self::Error> {
        GstRate::from_percent(percent)
    }
}

impl From<GstRate> for u8 {
    fn from(rate: GstRate) -> u8 {
        rate.percent()
    }
}

impl fmt::Display for GstRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Tax split for an amount or a whole document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GstBreakdown {
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_gst: Money,
    pub is_inter_state: bool,
}

impl GstBreakdown {
    pub fn zero(is_inter_state: bool) -> Self {
        Self {
            is_inter_state,
            ..Self::default()
        }
    }

    /// Rounds to paise. The total is rounded once and the components are
    /// derived from it, so CGST + SGST + IGST always equals the total.
    /// Any odd paisa of an intra-state split lands on CGST.
    pub fn rounded(&self) -> Self {
        let total_gst = self.total_gst.rounded();
        if self.is_inter_state {
            Self {
                cgst: Money::zero(),
                sgst: Money::zero(),
                igst: total_gst,
                total_gst,
                is_inter_state: true,
            }
        } else {
            let cgst = total_gst.halve().rounded();
            Self {
                cgst,
                sgst: total_gst - cgst,
                igst: Money::zero(),
                total_gst,
                is_inter_state: false,
            }
        }
    }
}

impl Add for GstBreakdown {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            cgst: self.cgst + other.cgst,
            sgst: self.sgst + other.sgst,
            igst: self.igst + other.igst,
            total_gst: self.total_gst + other.total_gst,
            is_inter_state: self.is_inter_state || other.is_inter_state,
        }
    }
}

impl Sum for GstBreakdown {
    fn sum<I: Iterator<Item = GstBreakdown>>(iter: I) -> Self {
        iter.fold(GstBreakdown::default(), Add::add)
    }
}

/// Computes GST on `amount` at full precision
pub fn calculate_gst(amount: Money, rate: GstRate, is_inter_state: bool) -> GstBreakdown {
    let gst = amount.percent(rate.as_decimal());

    if is_inter_state {
        GstBreakdown {
            cgst: Money::zero(),
            sgst: Money::zero(),
            igst: gst,
            total_gst: gst,
            is_inter_state,
        }
    } else {
        let half = gst.halve();
        GstBreakdown {
            cgst: half,
            sgst: half,
            igst: Money::zero(),
            total_gst: gst,
            is_inter_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_intra_state_split() {
        let gst = calculate_gst(Money::new(dec!(1000)), GstRate::Eighteen, false);
        assert_eq!(gst.cgst, Money::new(dec!(90)));
        assert_eq!(gst.sgst, Money::new(dec!(90)));
        assert_eq!(gst.igst, Money::zero());
        assert_eq!(gst.total_gst, Money::new(dec!(180)));
    }

    #[test]
    fn test_inter_state_is_all_igst() {
        let gst = calculate_gst(Money::new(dec!(1000)), GstRate::Eighteen, true);
        assert_eq!(gst.cgst, Money::zero());
        assert_eq!(gst.sgst, Money::zero());
        assert_eq!(gst.igst, Money::new(dec!(180)));
        assert_eq!(gst.total_gst, Money::new(dec!(180)));
    }

    #[test]
    fn test_exempt_rate() {
        let gst = calculate_gst(Money::new(dec!(750)), GstRate::Exempt, false);
        assert!(gst.total_gst.is_zero());
    }

    #[test]
    fn test_rate_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&GstRate::Twelve).unwrap(), "12");
        let rate: GstRate = serde_json::from_str("28").unwrap();
        assert_eq!(rate, GstRate::TwentyEight);
        assert!(serde_json::from_str::<GstRate>("15").is_err());
    }

    #[test]
    fn test_sum_rounds_once() {
        // 3 x 0.05 at 5% is 0.0075 total; per-line rounding would give 0.00
        let lines = vec![Money::new(dec!(0.05)); 3];
        let total: GstBreakdown = lines
            .into_iter()
            .map(|amount| calculate_gst(amount, GstRate::Five, false))
            .sum();
        assert_eq!(total.total_gst.amount(), dec!(0.0075));
        assert_eq!(total.rounded().total_gst.amount(), dec!(0.01));
    }
}
