//! Value Objects for the storefront

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;

/// Coupon code value object. Stored trimmed and upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub const MAX_LEN: usize = 32;

    pub fn new(value: impl Into<String>) -> Result<Self, CouponCodeError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(CouponCodeError::Empty); }
        if value.len() > Self::MAX_LEN { return Err(CouponCodeError::TooLong); }
        if value.chars().any(char::is_whitespace) { return Err(CouponCodeError::Whitespace); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::new(value) }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self { code.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponCodeError {
    #[error("Coupon code is required")]
    Empty,
    #[error("Coupon code is too long")]
    TooLong,
    #[error("Coupon code must not contain spaces")]
    Whitespace,
}

/// Money value object. Single-currency (rupees), full decimal precision;
/// rounding happens only in [`Money::rounded`] and `Display`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }
    pub fn is_negative(&self) -> bool { self.0 < Decimal::ZERO }
    pub fn add(&self, other: &Money) -> Money { Money(self.0.saturating_add(other.0)) }
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0.saturating_mul(Decimal::from(qty))) }
    pub fn checked_add(&self, other: &Money) -> Option<Money> { self.0.checked_add(other.0).map(Money) }
    pub fn checked_multiply(&self, qty: u32) -> Option<Money> { self.0.checked_mul(Decimal::from(qty)).map(Money) }

    /// `self × pct / 100`, unrounded. `pct` is at most 100, so this cannot
    /// grow past `self`.
    pub fn percent(&self, pct: Decimal) -> Money { Money(self.0 * (pct / Decimal::ONE_HUNDRED)) }

    /// Subtraction clamped at zero.
    pub fn saturating_sub(&self, other: &Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(Decimal::ZERO))
    }

    /// Rounded to paise, for display and for comparing client-computed totals.
    pub fn rounded(&self) -> Money { Money(self.0.round_dp(2)) }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self { Self(amount) }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self { Self(Decimal::from(amount)) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc.add(&m))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0.round_dp(2).normalize())
    }
}

/// Stock quantity value object. Never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 { None } else { Some(Self(self.0 - other)) }
    }
    pub fn saturating_subtract(&self, other: u32) -> Self { Self(self.0.saturating_sub(other)) }
    pub fn covers(&self, requested: u32) -> bool { self.0 >= requested }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_code_normalized() {
        let code = CouponCode::new("  save10 ").unwrap();
        assert_eq!(code.as_str(), "SAVE10");
        assert_eq!(CouponCode::new("   "), Err(CouponCodeError::Empty));
        assert_eq!(CouponCode::new("SAVE 10"), Err(CouponCodeError::Whitespace));
    }

    #[test]
    fn test_money_percent_keeps_precision() {
        let subtotal = Money::new(Decimal::new(33333, 2)); // 333.33
        let discount = subtotal.percent(Decimal::new(15, 0));
        assert_eq!(discount.amount(), Decimal::new(499995, 4)); // 49.9995
        assert_eq!(discount.rounded().amount(), Decimal::new(5000, 2));
    }

    #[test]
    fn test_money_saturating_sub() {
        let a = Money::from(100);
        assert_eq!(a.saturating_sub(&Money::from(150)), Money::ZERO);
        assert_eq!(a.saturating_sub(&Money::from(30)), Money::from(70));
    }

    #[test]
    fn test_money_overflow_is_checked() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.checked_multiply(2), None);
        assert_eq!(huge.checked_add(&Money::from(1)), None);
        assert_eq!(Money::from(120).checked_multiply(3), Some(Money::from(360)));
        // the plain operators saturate instead of panicking
        assert_eq!(huge.multiply(5), huge);
        assert_eq!([huge, huge].into_iter().sum::<Money>(), huge);
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from(500).to_string(), "₹500");
        assert_eq!(Money::new(Decimal::new(12050, 2)).to_string(), "₹120.5");
    }

    #[test]
    fn test_quantity_subtract() {
        let q = Quantity::new(5);
        assert_eq!(q.subtract(3), Some(Quantity::new(2)));
        assert_eq!(q.subtract(6), None);
        assert_eq!(q.saturating_subtract(9), Quantity::new(0));
    }
}
