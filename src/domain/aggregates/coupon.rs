//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::value_objects::{CouponCode, CouponCodeError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType { Percentage, Flat }

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "PERCENTAGE", Self::Flat => "FLAT" }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = CouponError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERCENTAGE" => Ok(Self::Percentage),
            "FLAT" => Ok(Self::Flat),
            other => Err(CouponError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: Uuid,
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Money,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    #[serde(default)]
    pub min_order_amount: Money,
    #[serde(default = "active")]
    pub is_active: bool,
}

fn active() -> bool { true }

/// A successful verification: what the coupon takes off this subtotal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub discount_amount: Money,
    pub code: CouponCode,
    #[serde(rename = "type")]
    pub discount_type: DiscountType,
    pub value: Decimal,
}

impl Coupon {
    pub fn create(new: NewCoupon) -> Result<Self, CouponError> {
        let code = CouponCode::new(new.code)?;
        let value_ok = match new.discount_type {
            DiscountType::Percentage => new.discount_value >= Decimal::ZERO && new.discount_value <= Decimal::ONE_HUNDRED,
            DiscountType::Flat => new.discount_value >= Decimal::ZERO,
        };
        if !value_ok { return Err(CouponError::InvalidValue); }
        if new.min_order_amount.is_negative() { return Err(CouponError::InvalidMinimum); }
        Ok(Self {
            id: Uuid::now_v7(), code, discount_type: new.discount_type, discount_value: new.discount_value,
            min_order_amount: new.min_order_amount, is_active: new.is_active, created_at: Utc::now(),
        })
    }

    /// Discount for `subtotal`, never more than the subtotal itself and never
    /// rounded.
    pub fn apply(&self, subtotal: Money) -> Result<AppliedCoupon, CouponError> {
        if subtotal < self.min_order_amount { return Err(CouponError::BelowMinimum(self.min_order_amount)); }
        let raw = match self.discount_type {
            DiscountType::Percentage => subtotal.percent(self.discount_value),
            DiscountType::Flat => Money::new(self.discount_value),
        };
        Ok(AppliedCoupon {
            discount_amount: raw.min(subtotal),
            code: self.code.clone(),
            discount_type: self.discount_type,
            value: self.discount_value,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon code is required")]
    Required,
    #[error("Invalid coupon code")]
    Invalid,
    #[error("Minimum order amount of {0} required")]
    BelowMinimum(Money),
    #[error("Percentage discounts must be between 0 and 100, flat discounts at least 0")]
    InvalidValue,
    #[error("Minimum order amount cannot be negative")]
    InvalidMinimum,
    #[error("Unknown discount type {0}")]
    UnknownType(String),
    #[error(transparent)]
    Code(#[from] CouponCodeError),
}
