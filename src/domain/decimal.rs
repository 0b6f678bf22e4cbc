//! Banker-safe fixed-point decimal for wallet and price math.
//!
//! Multiplicative results are rounded to a fixed money scale with banker's
//! rounding (midpoint-to-even), so PnL, sizing, and ratio computations never
//! accumulate one-sided rounding drift and never overflow rust_decimal's
//! 28-digit mantissa on long division chains. Addition and subtraction stay
//! exact.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal as Inner, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale every multiplication and division result is rounded to.
///
/// Ten fractional digits is two orders finer than the quote vendor's
/// tightest price increment, so capped stop levels and PnL stay exact at
/// display precision.
const MONEY_SCALE: u32 = 10;

/// Fixed-point decimal for prices, collateral, and PnL.
///
/// Serializes to a JSON number (not a string).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] Inner);

impl Decimal {
    /// Parse from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn parse(s: &str) -> Result<Self, rust_decimal::Error> {
        s.parse::<Inner>().map(Decimal)
    }

    /// Convert from an f64 (webhook bodies and vendor payloads carry JSON
    /// numbers). Returns None for NaN/infinity or out-of-range values.
    pub fn from_f64(value: f64) -> Option<Self> {
        Inner::from_f64(value).map(Decimal)
    }

    pub fn from_i64(value: i64) -> Self {
        Decimal(Inner::from(value))
    }

    pub fn zero() -> Self {
        Decimal(Inner::ZERO)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Signed fractional change from `base` to `self`: `(self - base) / base`.
    ///
    /// The leveraged-PnL building block: a long position's return is the
    /// exit price's change ratio from entry.
    pub fn change_ratio(self, base: Decimal) -> Decimal {
        (self - base) / base
    }

    /// Absolute fractional distance from `base`: `|self - base| / base`.
    ///
    /// Used to measure how far a stop level sits from entry.
    pub fn distance_ratio(self, base: Decimal) -> Decimal {
        self.change_ratio(base).abs()
    }

    /// Floor at zero. The wallet balance is never allowed below zero.
    pub fn clamp_non_negative(&self) -> Self {
        if self.is_negative() {
            Decimal::zero()
        } else {
            *self
        }
    }

    fn round_money(value: Inner) -> Self {
        Decimal(value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl std::ops::Add for Decimal {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

// Multiplicative results carry the money-scale banker rounding.

impl std::ops::Mul for Decimal {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::round_money(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self::round_money(self.0 / rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        for s in ["123.456", "0.0001", "1000000", "-95.5", "0"] {
            let d = Decimal::parse(s).expect("parse failed");
            let reparsed = Decimal::parse(&d.to_string()).expect("reparse failed");
            assert_eq!(d, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_leveraged_pnl_arithmetic() {
        let entry = Decimal::parse("100").unwrap();
        let exit = Decimal::parse("110").unwrap();
        let size = Decimal::parse("100").unwrap();
        let leverage = Decimal::from_i64(2);

        let pnl = exit.change_ratio(entry) * size * leverage;
        assert_eq!(pnl, Decimal::parse("20").unwrap());
    }

    #[test]
    fn test_change_ratio_signed() {
        let entry = Decimal::parse("100").unwrap();
        assert_eq!(
            Decimal::parse("94").unwrap().change_ratio(entry),
            Decimal::parse("-0.06").unwrap()
        );
        assert_eq!(
            Decimal::parse("110").unwrap().change_ratio(entry),
            Decimal::parse("0.1").unwrap()
        );
    }

    #[test]
    fn test_distance_ratio_is_absolute() {
        let entry = Decimal::parse("100").unwrap();
        assert_eq!(
            Decimal::parse("50").unwrap().distance_ratio(entry),
            Decimal::parse("0.5").unwrap()
        );
        assert_eq!(
            Decimal::parse("150").unwrap().distance_ratio(entry),
            Decimal::parse("0.5").unwrap()
        );
    }

    #[test]
    fn test_division_rounds_to_money_scale() {
        let third = Decimal::from_i64(1) / Decimal::from_i64(3);
        assert_eq!(third, Decimal::parse("0.3333333333").unwrap());
    }

    #[test]
    fn test_midpoint_rounds_to_even() {
        let one = Decimal::from_i64(1);
        // Both midpoints sit exactly between the last two money-scale digits:
        // 0.25e-9 rounds down to the even 2, 0.35e-9 rounds up to the even 4.
        assert_eq!(
            Decimal::parse("0.00000000025").unwrap() * one,
            Decimal::parse("0.0000000002").unwrap()
        );
        assert_eq!(
            Decimal::parse("0.00000000035").unwrap() * one,
            Decimal::parse("0.0000000004").unwrap()
        );
    }

    #[test]
    fn test_addition_stays_exact() {
        let a = Decimal::parse("0.00000000000001").unwrap();
        let b = Decimal::parse("1").unwrap();
        assert_eq!(a + b, Decimal::parse("1.00000000000001").unwrap());
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(
            Decimal::parse("-5").unwrap().clamp_non_negative(),
            Decimal::zero()
        );
        let positive = Decimal::parse("5").unwrap();
        assert_eq!(positive.clamp_non_negative(), positive);
    }

    #[test]
    fn test_serializes_as_json_number() {
        let d = Decimal::parse("95.5").unwrap();
        let json = serde_json::to_value(d).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "95.5");
    }

    #[test]
    fn test_from_f64_rejects_nan() {
        assert!(Decimal::from_f64(f64::NAN).is_none());
        assert!(Decimal::from_f64(42.5).is_some());
    }

    #[test]
    fn test_sign_predicates() {
        assert!(Decimal::parse("0.01").unwrap().is_positive());
        assert!(Decimal::parse("-0.01").unwrap().is_negative());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
    }
}
