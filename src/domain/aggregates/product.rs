//! Product Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::{Money, Quantity};

/// A catalog product. When `has_variants` is set, the per-variant price and
/// stock are authoritative and the parent `stock` is a display aggregate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Money>,
    pub image_url: String,
    pub category: String,
    pub stock: Quantity,
    pub unit: String,
    pub has_variants: bool,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub name: String,
    pub price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Money>,
    pub stock: Quantity,
}

impl Variant {
    pub fn effective_price(&self) -> Money { self.discounted_price.unwrap_or(self.price) }
}

/// Which SKU of a product a line refers to. On the wire this is the optional
/// `variant` field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Selection {
    #[default]
    Base,
    Variant(String),
}

impl Selection {
    pub fn variant(name: impl Into<String>) -> Self { Self::Variant(name.into()) }
    pub fn is_base(&self) -> bool { matches!(self, Self::Base) }
    pub fn variant_name(&self) -> Option<&str> {
        match self { Self::Base => None, Self::Variant(name) => Some(name) }
    }
}

impl From<Option<String>> for Selection {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.is_empty() => Self::Variant(name),
            _ => Self::Base,
        }
    }
}

impl From<Selection> for Option<String> {
    fn from(value: Selection) -> Self {
        match value { Selection::Base => None, Selection::Variant(name) => Some(name) }
    }
}

/// Admin-supplied product fields, used for both create and update.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub discounted_price: Option<Money>,
    #[serde(default)]
    pub image_url: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[serde(default)]
    pub stock: Quantity,
    #[validate(length(min = 1))]
    pub unit: String,
    #[serde(default)]
    pub has_variants: bool,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// Query for the public product listing.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if product.category != category { return false; }
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            if !product.name.to_lowercase().contains(&search.to_lowercase()) { return false; }
        }
        true
    }
}

impl Product {
    pub fn create(draft: ProductDraft) -> Result<Self, ProductError> {
        let mut product = Self {
            id: Uuid::now_v7(), name: String::new(), description: String::new(),
            price: Money::ZERO, discounted_price: None, image_url: String::new(),
            category: String::new(), stock: Quantity::default(), unit: String::new(),
            has_variants: false, variants: vec![], created_at: Utc::now(),
        };
        product.apply(draft)?;
        Ok(product)
    }

    /// Replaces the editable fields, validating the result first.
    pub fn apply(&mut self, draft: ProductDraft) -> Result<(), ProductError> {
        validate_pricing(&draft.name, draft.price, draft.discounted_price)?;
        if draft.has_variants && draft.variants.is_empty() { return Err(ProductError::MissingVariants); }
        let mut seen = HashSet::new();
        for v in &draft.variants {
            if v.name.trim().is_empty() { return Err(ProductError::InvalidName); }
            if !seen.insert(v.name.as_str()) { return Err(ProductError::DuplicateVariant(v.name.clone())); }
            validate_pricing(&v.name, v.price, v.discounted_price)?;
        }
        self.name = draft.name;
        self.description = draft.description;
        self.price = draft.price;
        self.discounted_price = draft.discounted_price;
        self.image_url = draft.image_url;
        self.category = draft.category;
        self.stock = draft.stock;
        self.unit = draft.unit;
        self.has_variants = draft.has_variants;
        self.variants = draft.variants;
        Ok(())
    }

    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Price a new cart line snapshots: discounted price when present.
    pub fn unit_price(&self, selection: &Selection) -> Result<Money, ProductError> {
        match selection {
            Selection::Base => Ok(self.discounted_price.unwrap_or(self.price)),
            Selection::Variant(name) => self.variant(name).map(Variant::effective_price).ok_or_else(|| self.variant_missing(name)),
        }
    }

    pub fn available(&self, selection: &Selection) -> Result<Quantity, ProductError> {
        match selection {
            Selection::Base => Ok(self.stock),
            Selection::Variant(name) => self.variant(name).map(|v| v.stock).ok_or_else(|| self.variant_missing(name)),
        }
    }

    pub fn is_in_stock(&self) -> bool {
        if self.has_variants { self.variants.iter().any(|v| !v.stock.is_zero()) } else { !self.stock.is_zero() }
    }

    /// Checks and decrements stock for one order line. A variant line also
    /// lowers the aggregate `stock` cache by the same amount.
    pub fn reserve(&mut self, selection: &Selection, quantity: u32) -> Result<(), ProductError> {
        match selection {
            Selection::Variant(name) => {
                let product = self.name.clone();
                let variant = self.variants.iter_mut().find(|v| &v.name == name)
                    .ok_or_else(|| ProductError::VariantNotFound { product: product.clone(), variant: name.clone() })?;
                variant.stock = variant.stock.subtract(quantity).ok_or(ProductError::InsufficientStock {
                    product, variant: Some(name.clone()), available: variant.stock.value(),
                })?;
                self.stock = self.stock.saturating_subtract(quantity);
            }
            Selection::Base => {
                self.stock = self.stock.subtract(quantity).ok_or_else(|| ProductError::InsufficientStock {
                    product: self.name.clone(), variant: None, available: self.stock.value(),
                })?;
            }
        }
        Ok(())
    }

    /// Lowers the aggregate `stock` field only, clamping at zero. Returns
    /// `false` when the clamp kicked in.
    pub fn deduct_aggregate(&mut self, quantity: u32) -> bool {
        let exact = self.stock.covers(quantity);
        self.stock = self.stock.saturating_subtract(quantity);
        exact
    }

    fn variant_missing(&self, name: &str) -> ProductError {
        ProductError::VariantNotFound { product: self.name.clone(), variant: name.to_string() }
    }
}

fn validate_pricing(name: &str, price: Money, discounted: Option<Money>) -> Result<(), ProductError> {
    if name.trim().is_empty() { return Err(ProductError::InvalidName); }
    if !price.is_positive() { return Err(ProductError::InvalidPrice(name.to_string())); }
    if let Some(d) = discounted {
        if d.is_negative() || d >= price { return Err(ProductError::InvalidDiscount(name.to_string())); }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Name is required")]
    InvalidName,
    #[error("Price of {0} must be greater than zero")]
    InvalidPrice(String),
    #[error("Discounted price of {0} must be below its price")]
    InvalidDiscount(String),
    #[error("Variant {0} is listed more than once")]
    DuplicateVariant(String),
    #[error("A product with variants needs at least one variant")]
    MissingVariants,
    #[error("Variant {variant} not found for {product}")]
    VariantNotFound { product: String, variant: String },
    #[error("Insufficient stock for {product}{}. Only {available} available", .variant.as_ref().map(|v| format!(" ({v})")).unwrap_or_default())]
    InsufficientStock { product: String, variant: Option<String>, available: u32 },
}
