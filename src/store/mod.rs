//! Persistence seam.
//!
//! Every multi-record write that must not be observed half-done
//! (order placement, order completion, category rename) is a single store
//! call so each backend can run it under one lock or transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::{
    Admin, Category, CategoryDraft, Coupon, Order, OrderItem, OrderStatus, Product, ProductFilter,
};
use crate::{Result, StorefrontError};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Outcome of a status change.
#[derive(Clone, Debug)]
pub struct Transition {
    pub order: Order,
    pub from: OrderStatus,
    pub stock_deducted: bool,
}

/// Outcome of a category update.
#[derive(Clone, Debug)]
pub struct CategoryUpdate {
    pub category: Category,
    pub previous_name: String,
    pub products_renamed: u64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>>;
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, product: &Product) -> Result<bool>;
    async fn delete_product(&self, id: Uuid) -> Result<bool>;

    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> Result<Option<Category>>;
    async fn insert_category(&self, category: &Category) -> Result<()>;
    /// Inserts unless a category with the same name exists.
    async fn insert_category_if_absent(&self, category: &Category) -> Result<bool>;
    /// Updates a category and renames every product still carrying its old
    /// name, atomically.
    async fn update_category(&self, id: Uuid, draft: &CategoryDraft) -> Result<Option<CategoryUpdate>>;
    async fn delete_category(&self, id: Uuid) -> Result<bool>;

    async fn list_coupons(&self) -> Result<Vec<Coupon>>;
    /// Exact, case-sensitive match against the stored code.
    async fn find_active_coupon(&self, code: &str) -> Result<Option<Coupon>>;
    async fn coupon_code_exists(&self, code: &str) -> Result<bool>;
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()>;
    async fn delete_coupon(&self, id: Uuid) -> Result<bool>;

    async fn list_admins(&self) -> Result<Vec<Admin>>;
    async fn find_admin(&self, email: &str) -> Result<Option<Admin>>;
    async fn insert_admin(&self, admin: &Admin) -> Result<()>;
    async fn delete_admin(&self, id: Uuid) -> Result<bool>;

    /// Reserves stock for every item in submission order and stores the
    /// order. All or nothing: a failing item leaves every product untouched.
    async fn place_order(&self, order: &Order) -> Result<()>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>>;
    async fn list_orders(&self) -> Result<Vec<Order>>;
    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>>;
    /// Sets the status. Entering `completed` from any other status first
    /// lowers each item's product aggregate stock, in the same unit of work.
    async fn transition_order(&self, id: Uuid, status: OrderStatus) -> Result<Option<Transition>>;
}

/// Applies the reservation for `items` to the loaded `products`. Returns the
/// ids of the products that changed, first-touched first.
pub(crate) fn reserve_items(products: &mut HashMap<Uuid, Product>, items: &[OrderItem]) -> Result<Vec<Uuid>> {
    let mut touched = Vec::new();
    for item in items {
        let product = products
            .get_mut(&item.product_id)
            .ok_or_else(|| StorefrontError::not_found(format!("Product {} not found", item.name)))?;
        product.reserve(&item.selection, item.quantity)?;
        tracing::debug!(product_id = %item.product_id, variant = ?item.selection.variant_name(), quantity = item.quantity, "stock reserved");
        if !touched.contains(&item.product_id) {
            touched.push(item.product_id);
        }
    }
    Ok(touched)
}

/// Completion deduction on the aggregate `stock` field. Products that no
/// longer exist are skipped.
pub(crate) fn deduct_completed(products: &mut HashMap<Uuid, Product>, order: &Order) -> Vec<Uuid> {
    let mut touched = Vec::new();
    for (product_id, quantity) in order.stock_lines() {
        let Some(product) = products.get_mut(&product_id) else {
            tracing::warn!(order_id = %order.id, %product_id, "completed order references a missing product");
            continue;
        };
        if !product.deduct_aggregate(quantity) {
            tracing::warn!(order_id = %order.id, %product_id, quantity, "aggregate stock clamped at zero");
        }
        if !touched.contains(&product_id) {
            touched.push(product_id);
        }
    }
    touched
}
