//! Postgres store. Multi-row workflows run inside one transaction and lock
//! the product rows they touch (`FOR UPDATE`, in id order) before checking
//! stock, so concurrent orders cannot oversell.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::{deduct_completed, reserve_items, CategoryUpdate, Store, Transition};
use crate::domain::aggregates::{
    Admin, Category, CategoryDraft, Coupon, Order, OrderItem, OrderStatus, Product, ProductFilter, Variant,
};
use crate::domain::value_objects::{CouponCode, Money, Quantity};
use crate::{Result, StorefrontError};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Connects and runs pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(max_connections).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }

    async fn lock_products(tx: &mut Transaction<'_, Postgres>, ids: Vec<Uuid>) -> Result<HashMap<Uuid, Product>> {
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(ids).fetch_all(&mut **tx).await?;
        rows.into_iter().map(|r| Product::try_from(r).map(|p| (p.id, p))).collect()
    }

    async fn write_stock(tx: &mut Transaction<'_, Postgres>, product: &Product) -> Result<()> {
        sqlx::query("UPDATE products SET stock = $2, variants = $3 WHERE id = $1")
            .bind(product.id).bind(stock_column(product.stock)?).bind(Json(&product.variants))
            .execute(&mut **tx).await?;
        Ok(())
    }
}

fn stock_column(q: Quantity) -> Result<i32> {
    i32::try_from(q.value()).map_err(|_| StorefrontError::validation("Stock value too large"))
}

fn stock_from_column(v: i32) -> Result<Quantity> {
    u32::try_from(v).map(Quantity::new).map_err(|_| StorefrontError::Storage(format!("negative stock {v} in database")))
}

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid, name: String, description: String, price: Decimal, discounted_price: Option<Decimal>,
    image_url: String, category: String, stock: i32, unit: String, has_variants: bool,
    variants: Json<Vec<Variant>>, created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StorefrontError;
    fn try_from(r: ProductRow) -> Result<Self> {
        Ok(Product {
            id: r.id, name: r.name, description: r.description, price: Money::new(r.price),
            discounted_price: r.discounted_price.map(Money::new), image_url: r.image_url, category: r.category,
            stock: stock_from_column(r.stock)?, unit: r.unit, has_variants: r.has_variants,
            variants: r.variants.0, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow { id: Uuid, name: String, description: String, created_at: DateTime<Utc> }

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self { Category { id: r.id, name: r.name, description: r.description, created_at: r.created_at } }
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid, code: String, discount_type: String, discount_value: Decimal, min_order_amount: Decimal,
    is_active: bool, created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = StorefrontError;
    fn try_from(r: CouponRow) -> Result<Self> {
        Ok(Coupon {
            id: r.id, code: CouponCode::new(r.code)?, discount_type: r.discount_type.parse()?,
            discount_value: r.discount_value, min_order_amount: Money::new(r.min_order_amount),
            is_active: r.is_active, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow { id: Uuid, email: String, added_by: String, created_at: DateTime<Utc> }

impl From<AdminRow> for Admin {
    fn from(r: AdminRow) -> Self { Admin { id: r.id, email: r.email, added_by: r.added_by, created_at: r.created_at } }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid, user_id: String, customer_name: String, customer_email: String, customer_phone: String,
    items: Json<Vec<OrderItem>>, total_amount: Decimal, discount: Option<Decimal>, coupon_code: Option<String>,
    status: String, delivery_address: String, delivery_option: String, created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StorefrontError;
    fn try_from(r: OrderRow) -> Result<Self> {
        Ok(Order {
            id: r.id, user_id: r.user_id, customer_name: r.customer_name, customer_email: r.customer_email,
            customer_phone: r.customer_phone, items: r.items.0, total_amount: Money::new(r.total_amount),
            discount: r.discount.map(Money::new), coupon_code: r.coupon_code, status: r.status.parse()?,
            delivery_address: r.delivery_address, delivery_option: r.delivery_option.parse()?, created_at: r.created_at,
        })
    }
}

fn orders_from(rows: Vec<OrderRow>) -> Result<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

// =============================================================================
// Store
// =============================================================================

#[async_trait]
impl Store for PgStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let category = filter.category.as_deref().filter(|c| !c.is_empty());
        let search = filter.search.as_deref().filter(|s| !s.is_empty());
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE ($1::text IS NULL OR category = $1) \
             AND ($2::text IS NULL OR position(lower($2) in lower(name)) > 0) \
             ORDER BY created_at DESC, id DESC")
            .bind(category).bind(search).fetch_all(&self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Product::try_from).transpose()
    }

    async fn insert_product(&self, p: &Product) -> Result<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, discounted_price, image_url, category, stock, unit, has_variants, variants, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(p.discounted_price.map(|m| m.amount()))
            .bind(&p.image_url).bind(&p.category).bind(stock_column(p.stock)?).bind(&p.unit).bind(p.has_variants)
            .bind(Json(&p.variants)).bind(p.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn update_product(&self, p: &Product) -> Result<bool> {
        let done = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, discounted_price = $5, image_url = $6, category = $7, stock = $8, unit = $9, has_variants = $10, variants = $11 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(p.discounted_price.map(|m| m.amount()))
            .bind(&p.image_url).bind(&p.category).bind(stock_column(p.stock)?).bind(&p.unit).bind(p.has_variants)
            .bind(Json(&p.variants))
            .execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories ORDER BY name").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(Category::from))
    }

    async fn insert_category(&self, c: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(c.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_category_if_absent(&self, c: &Category) -> Result<bool> {
        let done = sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4) ON CONFLICT (name) DO NOTHING")
            .bind(c.id).bind(&c.name).bind(&c.description).bind(c.created_at)
            .execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn update_category(&self, id: Uuid, draft: &CategoryDraft) -> Result<Option<CategoryUpdate>> {
        let mut tx = self.pool.begin().await?;
        let Some(existing) = sqlx::query_as::<_, CategoryRow>("SELECT * FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *tx).await? else { return Ok(None) };
        let name = draft.name.trim();
        let mut products_renamed = 0;
        if name != existing.name {
            products_renamed = sqlx::query("UPDATE products SET category = $2 WHERE category = $1")
                .bind(&existing.name).bind(name).execute(&mut *tx).await?.rows_affected();
        }
        let row = sqlx::query_as::<_, CategoryRow>("UPDATE categories SET name = $2, description = $3 WHERE id = $1 RETURNING *")
            .bind(id).bind(name).bind(&draft.description).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(Some(CategoryUpdate { category: row.into(), previous_name: existing.name, products_renamed }))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let rows = sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons ORDER BY created_at DESC").fetch_all(&self.pool).await?;
        rows.into_iter().map(Coupon::try_from).collect()
    }

    async fn find_active_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        sqlx::query_as::<_, CouponRow>("SELECT * FROM coupons WHERE code = $1 AND is_active")
            .bind(code).fetch_optional(&self.pool).await?.map(Coupon::try_from).transpose()
    }

    async fn coupon_code_exists(&self, code: &str) -> Result<bool> {
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM coupons WHERE code = $1)")
            .bind(code).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    async fn insert_coupon(&self, c: &Coupon) -> Result<()> {
        sqlx::query("INSERT INTO coupons (id, code, discount_type, discount_value, min_order_amount, is_active, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)")
            .bind(c.id).bind(c.code.as_str()).bind(c.discount_type.as_str()).bind(c.discount_value)
            .bind(c.min_order_amount.amount()).bind(c.is_active).bind(c.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_coupon(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM coupons WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn list_admins(&self) -> Result<Vec<Admin>> {
        let rows = sqlx::query_as::<_, AdminRow>("SELECT * FROM admins ORDER BY created_at DESC").fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Admin::from).collect())
    }

    async fn find_admin(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>("SELECT * FROM admins WHERE email = $1").bind(email).fetch_optional(&self.pool).await?;
        Ok(row.map(Admin::from))
    }

    async fn insert_admin(&self, a: &Admin) -> Result<()> {
        sqlx::query("INSERT INTO admins (id, email, added_by, created_at) VALUES ($1, $2, $3, $4)")
            .bind(a.id).bind(&a.email).bind(&a.added_by).bind(a.created_at)
            .execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_admin(&self, id: Uuid) -> Result<bool> {
        let done = sqlx::query("DELETE FROM admins WHERE id = $1").bind(id).execute(&self.pool).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn place_order(&self, o: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let ids: Vec<Uuid> = o.items.iter().map(|i| i.product_id).collect();
        let mut products = Self::lock_products(&mut tx, ids).await?;
        // An error here drops `tx`, rolling back.
        for id in reserve_items(&mut products, &o.items)? {
            Self::write_stock(&mut tx, &products[&id]).await?;
        }
        sqlx::query("INSERT INTO orders (id, user_id, customer_name, customer_email, customer_phone, items, total_amount, discount, coupon_code, status, delivery_address, delivery_option, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)")
            .bind(o.id).bind(&o.user_id).bind(&o.customer_name).bind(&o.customer_email).bind(&o.customer_phone)
            .bind(Json(&o.items)).bind(o.total_amount.amount()).bind(o.discount.map(|d| d.amount())).bind(&o.coupon_code)
            .bind(o.status.as_str()).bind(&o.delivery_address).bind(o.delivery_option.as_str()).bind(o.created_at)
            .execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id).fetch_optional(&self.pool).await?.map(Order::try_from).transpose()
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        orders_from(sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY created_at DESC").fetch_all(&self.pool).await?)
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        orders_from(sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user_id).fetch_all(&self.pool).await?)
    }

    async fn transition_order(&self, id: Uuid, status: OrderStatus) -> Result<Option<Transition>> {
        let mut tx = self.pool.begin().await?;
        let Some(row) = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id).fetch_optional(&mut *tx).await? else { return Ok(None) };
        let mut order = Order::try_from(row)?;
        let stock_deducted = order.completion_deducts(status);
        if stock_deducted {
            let ids = order.items.iter().map(|i| i.product_id).collect();
            let mut products = Self::lock_products(&mut tx, ids).await?;
            for product_id in deduct_completed(&mut products, &order) {
                Self::write_stock(&mut tx, &products[&product_id]).await?;
            }
        }
        let from = order.set_status(status);
        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id).bind(status.as_str()).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(Some(Transition { order, from, stock_deducted }))
    }
}
