//! Grocery Storefront
//!
//! Catalog browsing, coupon discounts and pickup/delivery orders for a small
//! grocery store, with an admin back-office.
//!
//! ## Features
//! - Product catalog with per-variant pricing and stock
//! - Client-held cart with merge semantics
//! - Percentage and flat coupons with minimum order amounts
//! - Order placement with all-or-nothing stock reservation
//! - Admin order status workflow and staff management

use thiserror::Error;

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod publisher;
pub mod service;
pub mod store;

use crate::domain::aggregates::{CartError, CouponError, OrderError, ProductError};
use crate::domain::value_objects::CouponCodeError;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;

impl StorefrontError {
    pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }
}

impl From<ProductError> for StorefrontError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::VariantNotFound { .. } => Self::NotFound(e.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<CartError> for StorefrontError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::Product(inner) => inner.into(),
            CartError::ItemNotFound => Self::NotFound(e.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<CouponError> for StorefrontError {
    fn from(e: CouponError) -> Self { Self::Validation(e.to_string()) }
}

impl From<CouponCodeError> for StorefrontError {
    fn from(e: CouponCodeError) -> Self { Self::Validation(e.to_string()) }
}

impl From<OrderError> for StorefrontError {
    fn from(e: OrderError) -> Self { Self::Validation(e.to_string()) }
}

impl From<validator::ValidationErrors> for StorefrontError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Validation(e.to_string()) }
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::Validation(format!("Duplicate value violates {}", db.constraint().unwrap_or("a unique constraint")))
            }
            _ => Self::Storage(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StorefrontError {
    fn from(e: sqlx::migrate::MigrateError) -> Self { Self::Storage(e.to_string()) }
}

impl From<serde_json::Error> for StorefrontError {
    fn from(e: serde_json::Error) -> Self { Self::Storage(e.to_string()) }
}
