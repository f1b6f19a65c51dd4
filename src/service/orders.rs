use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::Storefront;
use crate::auth::Caller;
use crate::domain::aggregates::{
    CartItem, Customer, Delivery, DeliveryOption, Order, OrderItem, OrderStatus, Totals,
};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

/// Body of `POST /orders`.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    #[validate(length(min = 1, message = "Order has no items"))]
    pub items: Vec<CartItem>,
    pub total_amount: Money,
    #[serde(default)]
    pub discount: Option<Money>,
    #[serde(default)]
    pub coupon_code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub customer_name: String,
    #[validate(length(min = 5, max = 20))]
    pub customer_phone: String,
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub delivery_option: DeliveryOption,
}

impl Storefront {
    /// Places an order for the authenticated caller.
    ///
    /// Amounts are recomputed from the submitted item snapshots (and the
    /// coupon, re-verified) before any stock is touched; the stock check and
    /// deduction for all items then commit together with the order or not at
    /// all.
    pub async fn place_order(&self, caller: Option<&Caller>, req: PlaceOrder) -> Result<Order> {
        let caller = caller.ok_or(StorefrontError::Unauthorized)?;
        req.validate()?;
        for item in &req.items {
            item.validate()?;
        }
        if req.delivery_option == DeliveryOption::Delivery && req.delivery_address.trim().is_empty() {
            return Err(StorefrontError::validation("Delivery address is required"));
        }

        let items: Vec<OrderItem> = req.items.into_iter().map(OrderItem::from).collect();
        let subtotal = Totals::compute(&items, Money::ZERO)?.subtotal;
        let coupon_code = req.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let (discount, coupon_code) = match coupon_code {
            Some(code) => {
                let applied = self.verify_coupon(Some(code), subtotal).await??;
                (applied.discount_amount, Some(applied.code.to_string()))
            }
            None => (Money::ZERO, None),
        };
        let totals = Totals::compute(&items, discount)?;
        totals.check(req.total_amount, req.discount)?;

        let customer = Customer {
            user_id: caller.user_id.clone(), email: caller.email.clone(),
            name: req.customer_name, phone: req.customer_phone,
        };
        let delivery = Delivery { address: req.delivery_address, option: req.delivery_option };
        let order = Order::place(customer, items, delivery, &totals, coupon_code)?;

        if let Err(e) = self.store.place_order(&order).await {
            tracing::info!(user_id = %caller.user_id, error = %e, "order rejected");
            return Err(e);
        }
        tracing::info!(order_id = %order.id, user_id = %order.user_id, items = order.items.len(), total = %order.total_amount, "order placed");
        self.events.publish(DomainEvent::OrderPlaced {
            order_id: order.id, user_id: order.user_id.clone(), total: order.total_amount, items: order.items.len(),
        }).await;
        Ok(order)
    }

    /// Admin status change. Entering `completed` lowers each item's product
    /// aggregate stock once; no transition is forbidden and nothing is
    /// restocked on cancel.
    pub async fn set_order_status(&self, caller: Option<&Caller>, id: Uuid, status: OrderStatus) -> Result<Order> {
        self.require_admin(caller).await?;
        let transition = self.store.transition_order(id, status).await?
            .ok_or_else(|| StorefrontError::not_found("Order not found"))?;
        tracing::info!(order_id = %id, from = %transition.from, to = %status, stock_deducted = transition.stock_deducted, "order status changed");
        self.events.publish(DomainEvent::OrderStatusChanged {
            order_id: id, from: transition.from, to: status, stock_deducted: transition.stock_deducted,
        }).await;
        Ok(transition.order)
    }

    /// Status change from its wire name; the caller's role is checked
    /// before the name is parsed.
    pub async fn set_order_status_named(&self, caller: Option<&Caller>, id: Uuid, status: &str) -> Result<Order> {
        self.require_admin(caller).await?;
        let status: OrderStatus = status.parse()?;
        self.set_order_status(caller, id, status).await
    }

    pub async fn list_orders(&self, caller: Option<&Caller>) -> Result<Vec<Order>> {
        self.require_admin(caller).await?;
        self.store.list_orders().await
    }

    pub async fn my_orders(&self, caller: Option<&Caller>) -> Result<Vec<Order>> {
        let caller = caller.ok_or(StorefrontError::Unauthorized)?;
        self.store.list_orders_for_user(&caller.user_id).await
    }

    /// Visible to the order's owner and to admins.
    pub async fn get_order(&self, caller: Option<&Caller>, id: Uuid) -> Result<Order> {
        let caller = caller.ok_or(StorefrontError::Unauthorized)?;
        let order = self.store.get_order(id).await?.ok_or_else(|| StorefrontError::not_found("Order not found"))?;
        if order.user_id != caller.user_id && !self.role_of(Some(caller)).await?.is_admin() {
            return Err(StorefrontError::Unauthorized);
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::{draft, rice};
    use crate::domain::aggregates::{DiscountType, NewCoupon, Product, Selection};
    use crate::service::tests::{owner, shopper, storefront};
    use rust_decimal::Decimal;

    fn line(p: &Product, selection: Selection, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: p.id, name: p.name.clone(), price: Money::from(price), quantity, selection,
            image_url: String::new(), unit: p.unit.clone(),
        }
    }

    fn request(items: Vec<CartItem>, total: i64) -> PlaceOrder {
        PlaceOrder {
            items, total_amount: Money::from(total), discount: None, coupon_code: None,
            customer_name: "Asha".into(), customer_phone: "9876543210".into(),
            delivery_address: String::new(), delivery_option: DeliveryOption::Pickup,
        }
    }

    async fn stock_of(shop: &Storefront, id: Uuid) -> u32 {
        shop.store().get_product(id).await.unwrap().unwrap().stock.value()
    }

    #[tokio::test]
    async fn test_end_to_end_with_coupon() {
        let shop = storefront();
        let p = Product::create(draft("Apples", 100, 10)).unwrap();
        shop.store().insert_product(&p).await.unwrap();
        shop.create_coupon(Some(&owner()), NewCoupon {
            code: "SAVE10".into(), discount_type: DiscountType::Percentage, discount_value: Decimal::from(10),
            min_order_amount: Money::ZERO, is_active: true,
        }).await.unwrap();

        let applied = shop.verify_coupon(Some("SAVE10"), Money::from(300)).await.unwrap().unwrap();
        assert_eq!(applied.discount_amount, Money::from(30));

        let mut req = request(vec![line(&p, Selection::Base, 100, 3)], 270);
        req.discount = Some(Money::from(30));
        req.coupon_code = Some("SAVE10".into());
        let order = shop.place_order(Some(&shopper()), req).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Money::from(270));
        assert_eq!(order.discount, Some(Money::from(30)));
        assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(order.customer_email, "shopper@example.com");
        assert_eq!(order.items[0].name, "Apples");
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.items[0].price, Money::from(100));
        assert_eq!(stock_of(&shop, p.id).await, 7);
        assert!(matches!(shop.events().recorded().await.last(), Some(DomainEvent::OrderPlaced { .. })));
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_product_untouched() {
        let shop = storefront();
        let p = Product::create(draft("Milk", 50, 2)).unwrap();
        shop.store().insert_product(&p).await.unwrap();
        let err = shop.place_order(Some(&shopper()), request(vec![line(&p, Selection::Base, 50, 3)], 150)).await.unwrap_err();
        assert_eq!(err.to_string(), "Insufficient stock for Milk. Only 2 available");
        assert_eq!(stock_of(&shop, p.id).await, 2);
    }

    #[tokio::test]
    async fn test_second_item_failure_rolls_back_first() {
        let shop = storefront();
        let milk = Product::create(draft("Milk", 50, 10)).unwrap();
        let bread = Product::create(draft("Bread", 40, 1)).unwrap();
        shop.store().insert_product(&milk).await.unwrap();
        shop.store().insert_product(&bread).await.unwrap();
        let req = request(vec![line(&milk, Selection::Base, 50, 2), line(&bread, Selection::Base, 40, 2)], 180);
        assert!(shop.place_order(Some(&shopper()), req).await.is_err());
        assert_eq!(stock_of(&shop, milk.id).await, 10);
        assert_eq!(stock_of(&shop, bread.id).await, 1);
        assert!(shop.store().list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_product_and_variant_are_not_found() {
        let shop = storefront();
        let rice = rice();
        shop.store().insert_product(&rice).await.unwrap();
        let ghost = Product::create(draft("Ghost", 10, 1)).unwrap();
        let err = shop.place_order(Some(&shopper()), request(vec![line(&ghost, Selection::Base, 10, 1)], 10)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(ref m) if m == "Product Ghost not found"));
        let err = shop.place_order(Some(&shopper()), request(vec![line(&rice, Selection::variant("2kg"), 200, 1)], 200)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(ref m) if m == "Variant 2kg not found for Basmati Rice"));
    }

    #[tokio::test]
    async fn test_variant_order_deducts_variant_and_aggregate() {
        let shop = storefront();
        let rice = rice();
        shop.store().insert_product(&rice).await.unwrap();
        shop.place_order(Some(&shopper()), request(vec![line(&rice, Selection::variant("5kg"), 550, 2)], 1100)).await.unwrap();
        let stored = shop.store().get_product(rice.id).await.unwrap().unwrap();
        assert_eq!(stored.variant("5kg").unwrap().stock.value(), 3);
        assert_eq!(stored.variant("1kg").unwrap().stock.value(), 10);
        assert_eq!(stored.stock.value(), 13);
    }

    #[tokio::test]
    async fn test_client_totals_are_checked() {
        let shop = storefront();
        let p = Product::create(draft("Milk", 50, 10)).unwrap();
        shop.store().insert_product(&p).await.unwrap();
        let err = shop.place_order(Some(&shopper()), request(vec![line(&p, Selection::Base, 50, 2)], 90)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(_)));
        let mut req = request(vec![line(&p, Selection::Base, 50, 2)], 100);
        req.coupon_code = Some("NOPE".into());
        let err = shop.place_order(Some(&shopper()), req).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid coupon code");
        assert_eq!(stock_of(&shop, p.id).await, 10);
    }

    #[tokio::test]
    async fn test_place_order_requires_caller_and_address() {
        let shop = storefront();
        let p = Product::create(draft("Milk", 50, 10)).unwrap();
        let req = request(vec![line(&p, Selection::Base, 50, 1)], 50);
        assert!(matches!(shop.place_order(None, req.clone()).await, Err(StorefrontError::Unauthorized)));
        let mut delivered = req;
        delivered.delivery_option = DeliveryOption::Delivery;
        assert_eq!(shop.place_order(Some(&shopper()), delivered).await.unwrap_err().to_string(), "Delivery address is required");
    }

    #[tokio::test]
    async fn test_completion_deducts_aggregate_once() {
        let shop = storefront();
        let p = Product::create(draft("Milk", 50, 10)).unwrap();
        shop.store().insert_product(&p).await.unwrap();
        let order = shop.place_order(Some(&shopper()), request(vec![line(&p, Selection::Base, 50, 2)], 100)).await.unwrap();
        assert_eq!(stock_of(&shop, p.id).await, 8);

        assert!(matches!(shop.set_order_status(Some(&shopper()), order.id, OrderStatus::Completed).await, Err(StorefrontError::Unauthorized)));
        let done = shop.set_order_status(Some(&owner()), order.id, OrderStatus::Completed).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert_eq!(stock_of(&shop, p.id).await, 6);
        shop.set_order_status(Some(&owner()), order.id, OrderStatus::Completed).await.unwrap();
        assert_eq!(stock_of(&shop, p.id).await, 6);
        // cancelled does not restock
        shop.set_order_status(Some(&owner()), order.id, OrderStatus::Cancelled).await.unwrap();
        assert_eq!(stock_of(&shop, p.id).await, 6);
    }

    #[tokio::test]
    async fn test_non_positive_price_is_rejected_before_stock() {
        let shop = storefront();
        let ghee = Product::create(draft("Ghee", 500, 10)).unwrap();
        shop.store().insert_product(&ghee).await.unwrap();
        let err = shop.place_order(Some(&shopper()), request(vec![line(&ghee, Selection::Base, -500, 3)], 0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Price of Ghee must be greater than zero");
        let err = shop.place_order(Some(&shopper()), request(vec![line(&ghee, Selection::Base, 0, 3)], 0)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(_)));
        assert_eq!(stock_of(&shop, ghee.id).await, 10);
        assert!(shop.store().list_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_huge_amounts_fail_without_panicking() {
        let shop = storefront();
        let gold = Product::create(draft("Gold", 500, 10)).unwrap();
        shop.store().insert_product(&gold).await.unwrap();
        let mut huge = line(&gold, Selection::Base, 1, 5);
        huge.price = Money::new(Decimal::from_i128_with_scale(70_000_000_000_000_000_000_000_000_000, 0));
        let err = shop.place_order(Some(&shopper()), request(vec![huge], 0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Order amount is too large");

        let err = shop.place_order(Some(&shopper()), request(vec![line(&gold, Selection::Base, 500, 10_001)], 0)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Validation(_)));
        assert_eq!(stock_of(&shop, gold.id).await, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_orders_never_oversell() {
        let shop = storefront();
        let p = Product::create(draft("Last Mango", 50, 1)).unwrap();
        shop.store().insert_product(&p).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let shop = shop.clone();
                let req = request(vec![line(&p, Selection::Base, 50, 1)], 50);
                tokio::spawn(async move { shop.place_order(Some(&shopper()), req).await })
            })
            .collect();
        let mut placed = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => placed += 1,
                Err(e) => assert_eq!(e.to_string(), "Insufficient stock for Last Mango. Only 0 available"),
            }
        }
        assert_eq!(placed, 1);
        assert_eq!(stock_of(&shop, p.id).await, 0);
        assert_eq!(shop.store().list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_named_status_checks_role_first() {
        let shop = storefront();
        let p = Product::create(draft("Milk", 50, 10)).unwrap();
        shop.store().insert_product(&p).await.unwrap();
        let order = shop.place_order(Some(&shopper()), request(vec![line(&p, Selection::Base, 50, 1)], 50)).await.unwrap();
        assert!(matches!(shop.set_order_status_named(Some(&shopper()), order.id, "bogus").await, Err(StorefrontError::Unauthorized)));
        assert!(matches!(shop.set_order_status_named(None, order.id, "bogus").await, Err(StorefrontError::Unauthorized)));
        assert!(matches!(shop.set_order_status_named(Some(&owner()), order.id, "bogus").await, Err(StorefrontError::Validation(_))));
        let done = shop.set_order_status_named(Some(&owner()), order.id, "processing").await.unwrap();
        assert_eq!(done.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_order_visibility() {
        let shop = storefront();
        let p = Product::create(draft("Milk", 50, 10)).unwrap();
        shop.store().insert_product(&p).await.unwrap();
        let order = shop.place_order(Some(&shopper()), request(vec![line(&p, Selection::Base, 50, 1)], 50)).await.unwrap();
        let stranger = Caller::new("user_x", "x@example.com");
        assert!(shop.get_order(Some(&shopper()), order.id).await.is_ok());
        assert!(shop.get_order(Some(&owner()), order.id).await.is_ok());
        assert!(matches!(shop.get_order(Some(&stranger), order.id).await, Err(StorefrontError::Unauthorized)));
        assert_eq!(shop.my_orders(Some(&shopper())).await.unwrap().len(), 1);
        assert!(shop.my_orders(Some(&stranger)).await.unwrap().is_empty());
        assert!(matches!(shop.list_orders(Some(&shopper())).await, Err(StorefrontError::Unauthorized)));
    }
}
