//! Order Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use crate::domain::aggregates::cart::CartItem;
use crate::domain::aggregates::product::Selection;
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub delivery_option: DeliveryOption,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of a purchased line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
    #[serde(default, rename = "variant", skip_serializing_if = "Selection::is_base")]
    pub selection: Selection,
}

impl OrderItem {
    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
}

impl From<CartItem> for OrderItem {
    fn from(item: CartItem) -> Self {
        Self { product_id: item.product_id, name: item.name, quantity: item.quantity, price: item.price, selection: item.selection }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Pending, Processing, Completed, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending", Self::Processing => "processing",
            Self::Completed => "completed", Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending), "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed), "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOption { Pickup, #[default] Delivery }

impl DeliveryOption {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pickup => "pickup", Self::Delivery => "delivery" }
    }
}

impl std::str::FromStr for DeliveryOption {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(Self::Pickup), "delivery" => Ok(Self::Delivery),
            other => Err(OrderError::UnknownDeliveryOption(other.to_string())),
        }
    }
}

/// Who the order is for. `user_id`/`email` come from the authenticated caller.
#[derive(Clone, Debug)]
pub struct Customer { pub user_id: String, pub email: String, pub name: String, pub phone: String }

#[derive(Clone, Debug, Default)]
pub struct Delivery { pub address: String, pub option: DeliveryOption }

/// Amounts as settled for an order: subtotal of the item snapshots, the
/// coupon discount and the clamped final total.
#[derive(Clone, Debug, PartialEq)]
pub struct Totals { pub subtotal: Money, pub discount: Money, pub total: Money }

impl Totals {
    /// Every line must carry a positive price; amounts that do not fit a
    /// `Decimal` are rejected rather than wrapped or saturated.
    pub fn compute(items: &[OrderItem], discount: Money) -> Result<Self, OrderError> {
        let mut subtotal = Money::ZERO;
        for item in items {
            if !item.price.is_positive() {
                return Err(OrderError::InvalidPrice(item.name.clone()));
            }
            subtotal = item.price.checked_multiply(item.quantity)
                .and_then(|line| subtotal.checked_add(&line))
                .ok_or(OrderError::AmountTooLarge)?;
        }
        let total = subtotal.saturating_sub(&discount);
        Ok(Self { subtotal, discount, total })
    }

    /// Compares client-submitted amounts against these, at paise precision.
    pub fn check(&self, total_amount: Money, discount: Option<Money>) -> Result<(), OrderError> {
        let submitted = discount.unwrap_or(Money::ZERO);
        if submitted.rounded() != self.discount.rounded() {
            return Err(OrderError::DiscountMismatch { expected: self.discount.rounded(), submitted });
        }
        if total_amount.rounded() != self.total.rounded() {
            return Err(OrderError::TotalMismatch { expected: self.total.rounded(), submitted: total_amount });
        }
        Ok(())
    }
}

impl Order {
    /// Builds a new `pending` order from item snapshots.
    pub fn place(customer: Customer, items: Vec<OrderItem>, delivery: Delivery, totals: &Totals, coupon_code: Option<String>) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        if let Some(item) = items.iter().find(|i| i.quantity == 0) {
            return Err(OrderError::InvalidQuantity(item.name.clone()));
        }
        let discount = (totals.discount != Money::ZERO).then_some(totals.discount);
        Ok(Self {
            id: Uuid::now_v7(), user_id: customer.user_id, customer_name: customer.name,
            customer_email: customer.email, customer_phone: customer.phone, items,
            total_amount: totals.total, discount, coupon_code, status: OrderStatus::Pending,
            delivery_address: delivery.address, delivery_option: delivery.option, created_at: Utc::now(),
        })
    }

    pub fn subtotal(&self) -> Money { self.items.iter().map(OrderItem::line_total).sum() }

    /// Whether moving to `next` triggers the completion stock deduction.
    pub fn completion_deducts(&self, next: OrderStatus) -> bool {
        next == OrderStatus::Completed && self.status != OrderStatus::Completed
    }

    /// Any transition is allowed; returns the previous status.
    pub fn set_status(&mut self, next: OrderStatus) -> OrderStatus {
        std::mem::replace(&mut self.status, next)
    }

    /// `(product, quantity)` pairs for the aggregate stock deduction.
    pub fn stock_lines(&self) -> Vec<(Uuid, u32)> {
        self.items.iter().map(|i| (i.product_id, i.quantity)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Quantity of {0} must be at least 1")]
    InvalidQuantity(String),
    #[error("Price of {0} must be greater than zero")]
    InvalidPrice(String),
    #[error("Order amount is too large")]
    AmountTooLarge,
    #[error("Order total does not match: expected {expected}, got {submitted}")]
    TotalMismatch { expected: Money, submitted: Money },
    #[error("Order discount does not match: expected {expected}, got {submitted}")]
    DiscountMismatch { expected: Money, submitted: Money },
    #[error("Unknown order status {0}")]
    UnknownStatus(String),
    #[error("Unknown delivery option {0}")]
    UnknownDeliveryOption(String),
}
