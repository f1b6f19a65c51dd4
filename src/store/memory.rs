//! In-process store. One `RwLock` guards all tables, so every trait method
//! is atomic with respect to every other.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{deduct_completed, reserve_items, CategoryUpdate, Store, Transition};
use crate::domain::aggregates::{
    Admin, Category, CategoryDraft, Coupon, Order, OrderStatus, Product, ProductFilter,
};
use crate::{Result, StorefrontError};

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    categories: HashMap<Uuid, Category>,
    coupons: HashMap<Uuid, Coupon>,
    admins: HashMap<Uuid, Admin>,
    orders: HashMap<Uuid, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

fn newest_first<T: Clone>(rows: impl Iterator<Item = T>, key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, Uuid)) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|r| std::cmp::Reverse(key(r)));
    rows
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.products.values().filter(|p| filter.matches(p)).cloned(), |p| (p.created_at, p.id)))
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.tables.write().await.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let mut t = self.tables.write().await;
        match t.products.get_mut(&product.id) {
            Some(existing) => { *existing = product.clone(); Ok(true) }
            None => Ok(false),
        }
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<Category> = self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.categories.values().any(|c| c.name == category.name) {
            return Err(StorefrontError::validation(format!("Category {} already exists", category.name)));
        }
        t.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn insert_category_if_absent(&self, category: &Category) -> Result<bool> {
        let mut t = self.tables.write().await;
        if t.categories.values().any(|c| c.name == category.name) {
            return Ok(false);
        }
        t.categories.insert(category.id, category.clone());
        Ok(true)
    }

    async fn update_category(&self, id: Uuid, draft: &CategoryDraft) -> Result<Option<CategoryUpdate>> {
        let mut t = self.tables.write().await;
        let Some(previous_name) = t.categories.get(&id).map(|c| c.name.clone()) else { return Ok(None) };
        let name = draft.name.trim().to_string();
        if name != previous_name && t.categories.values().any(|c| c.name == name) {
            return Err(StorefrontError::validation(format!("Category {name} already exists")));
        }
        let mut products_renamed = 0;
        if name != previous_name {
            for product in t.products.values_mut().filter(|p| p.category == previous_name) {
                product.category = name.clone();
                products_renamed += 1;
            }
        }
        let category = t.categories.get_mut(&id).ok_or_else(|| StorefrontError::not_found("Category not found"))?;
        category.name = name;
        category.description = draft.description.clone();
        Ok(Some(CategoryUpdate { category: category.clone(), previous_name, products_renamed }))
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.categories.remove(&id).is_some())
    }

    async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.coupons.values().cloned(), |c| (c.created_at, c.id)))
    }

    async fn find_active_coupon(&self, code: &str) -> Result<Option<Coupon>> {
        let t = self.tables.read().await;
        Ok(t.coupons.values().find(|c| c.is_active && c.code.as_str() == code).cloned())
    }

    async fn coupon_code_exists(&self, code: &str) -> Result<bool> {
        Ok(self.tables.read().await.coupons.values().any(|c| c.code.as_str() == code))
    }

    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.coupons.values().any(|c| c.code == coupon.code) {
            return Err(StorefrontError::validation("Coupon code already exists"));
        }
        t.coupons.insert(coupon.id, coupon.clone());
        Ok(())
    }

    async fn delete_coupon(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.coupons.remove(&id).is_some())
    }

    async fn list_admins(&self) -> Result<Vec<Admin>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.admins.values().cloned(), |a| (a.created_at, a.id)))
    }

    async fn find_admin(&self, email: &str) -> Result<Option<Admin>> {
        Ok(self.tables.read().await.admins.values().find(|a| a.email == email).cloned())
    }

    async fn insert_admin(&self, admin: &Admin) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.admins.values().any(|a| a.email == admin.email) {
            return Err(StorefrontError::validation("Admin already exists"));
        }
        t.admins.insert(admin.id, admin.clone());
        Ok(())
    }

    async fn delete_admin(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().await.admins.remove(&id).is_some())
    }

    async fn place_order(&self, order: &Order) -> Result<()> {
        let mut t = self.tables.write().await;
        // Work on copies; the table is only written once every item passed.
        let mut staged: HashMap<Uuid, Product> = order.items.iter()
            .filter_map(|i| t.products.get(&i.product_id).map(|p| (p.id, p.clone())))
            .collect();
        let touched = reserve_items(&mut staged, &order.items)?;
        for id in touched {
            if let Some(product) = staged.remove(&id) {
                t.products.insert(id, product);
            }
        }
        t.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.orders.values().cloned(), |o| (o.created_at, o.id)))
    }

    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>> {
        let t = self.tables.read().await;
        Ok(newest_first(t.orders.values().filter(|o| o.user_id == user_id).cloned(), |o| (o.created_at, o.id)))
    }

    async fn transition_order(&self, id: Uuid, status: OrderStatus) -> Result<Option<Transition>> {
        let mut guard = self.tables.write().await;
        let t = &mut *guard;
        let Some(order) = t.orders.get_mut(&id) else { return Ok(None) };
        let stock_deducted = order.completion_deducts(status);
        if stock_deducted {
            deduct_completed(&mut t.products, order);
        }
        let from = order.set_status(status);
        Ok(Some(Transition { order: order.clone(), from, stock_deducted }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::{draft, rice};
    use crate::domain::aggregates::{Customer, Delivery, OrderItem, Selection, Totals};
    use crate::domain::value_objects::Money;

    fn order_for(items: Vec<OrderItem>) -> Order {
        let totals = Totals::compute(&items, Money::ZERO).unwrap();
        let customer = Customer { user_id: "u1".into(), email: "u1@example.com".into(), name: "U".into(), phone: "1".into() };
        Order::place(customer, items, Delivery::default(), &totals, None).unwrap()
    }

    fn line(p: &Product, selection: Selection, quantity: u32) -> OrderItem {
        OrderItem { product_id: p.id, name: p.name.clone(), quantity, price: p.price, selection }
    }

    #[tokio::test]
    async fn test_place_order_is_all_or_nothing() {
        let store = MemoryStore::new();
        let milk = Product::create(draft("Milk", 50, 5)).unwrap();
        let bread = Product::create(draft("Bread", 40, 1)).unwrap();
        store.insert_product(&milk).await.unwrap();
        store.insert_product(&bread).await.unwrap();

        let order = order_for(vec![line(&milk, Selection::Base, 2), line(&bread, Selection::Base, 3)]);
        let err = store.place_order(&order).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(_)));
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock.value(), 5);
        assert!(store.get_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_place_order_same_product_twice_accumulates() {
        let store = MemoryStore::new();
        let rice = rice();
        store.insert_product(&rice).await.unwrap();
        let order = order_for(vec![line(&rice, Selection::variant("1kg"), 4), line(&rice, Selection::variant("1kg"), 6)]);
        store.place_order(&order).await.unwrap();
        let stored = store.get_product(rice.id).await.unwrap().unwrap();
        assert_eq!(stored.variant("1kg").unwrap().stock.value(), 0);
        assert_eq!(stored.stock.value(), 5);

        let again = order_for(vec![line(&rice, Selection::variant("1kg"), 1)]);
        assert!(store.place_order(&again).await.is_err());
    }

    #[tokio::test]
    async fn test_transition_deducts_once() {
        let store = MemoryStore::new();
        let milk = Product::create(draft("Milk", 50, 10)).unwrap();
        store.insert_product(&milk).await.unwrap();
        let order = order_for(vec![line(&milk, Selection::Base, 2)]);
        store.place_order(&order).await.unwrap();

        let t = store.transition_order(order.id, OrderStatus::Completed).await.unwrap().unwrap();
        assert!(t.stock_deducted);
        assert_eq!(t.from, OrderStatus::Pending);
        let t = store.transition_order(order.id, OrderStatus::Completed).await.unwrap().unwrap();
        assert!(!t.stock_deducted);
        assert_eq!(store.get_product(milk.id).await.unwrap().unwrap().stock.value(), 6);
        assert!(store.transition_order(Uuid::now_v7(), OrderStatus::Cancelled).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_rename_cascades() {
        let store = MemoryStore::new();
        let category = Category::create(CategoryDraft { name: "Beverages".into(), description: String::new() });
        store.insert_category(&category).await.unwrap();
        let tea = Product::create(draft("Tea", 90, 3)).unwrap();
        store.insert_product(&tea).await.unwrap();

        let update = store.update_category(category.id, &CategoryDraft { name: "Drinks".into(), description: "All drinks".into() })
            .await.unwrap().unwrap();
        assert_eq!(update.products_renamed, 1);
        assert_eq!(update.previous_name, "Beverages");
        assert_eq!(store.get_product(tea.id).await.unwrap().unwrap().category, "Drinks");
        assert_eq!(store.get_category(category.id).await.unwrap().unwrap().name, "Drinks");
    }

    #[tokio::test]
    async fn test_unique_fields() {
        let store = MemoryStore::new();
        store.insert_admin(&Admin::grant("a@example.com", "owner@example.com")).await.unwrap();
        assert!(store.insert_admin(&Admin::grant("a@example.com", "owner@example.com")).await.is_err());
        let c = Category::create(CategoryDraft { name: "Beverages".into(), description: String::new() });
        store.insert_category(&c).await.unwrap();
        let dup = Category::create(CategoryDraft { name: "Beverages".into(), description: String::new() });
        assert!(!store.insert_category_if_absent(&dup).await.unwrap());
        assert!(store.insert_category(&dup).await.is_err());
    }
}
