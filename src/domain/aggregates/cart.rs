//! Cart Aggregate
//!
//! The cart lives with the client until checkout; the server only ever sees
//! its lines inside an order request.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;
use crate::domain::aggregates::product::{Product, ProductError, Selection};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

/// One cart line. `price` is frozen when the line is first added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    pub price: Money,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
    #[serde(default, rename = "variant", skip_serializing_if = "Selection::is_base")]
    pub selection: Selection,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,
}

impl CartItem {
    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
    pub fn is(&self, product_id: Uuid, selection: &Selection) -> bool {
        self.product_id == product_id && &self.selection == selection
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn line_count(&self) -> usize { self.items.len() }
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity).sum() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Adds one unit of `product`/`selection`, merging with an existing line.
    /// Refuses to go past the stock currently known for that selection.
    pub fn add(&mut self, product: &Product, selection: Selection) -> Result<&CartItem, CartError> {
        let available = product.available(&selection)?.value();
        let position = match self.items.iter().position(|i| i.is(product.id, &selection)) {
            Some(pos) => {
                if self.items[pos].quantity >= available {
                    return Err(CartError::StockLimit { name: product.name.clone(), available });
                }
                self.items[pos].quantity += 1;
                pos
            }
            None => {
                if available == 0 { return Err(CartError::StockLimit { name: product.name.clone(), available }); }
                let price = product.unit_price(&selection)?;
                self.items.push(CartItem {
                    product_id: product.id, name: product.name.clone(), price, quantity: 1, selection,
                    image_url: product.image_url.clone(), unit: product.unit.clone(),
                });
                self.items.len() - 1
            }
        };
        Ok(&self.items[position])
    }

    /// Sets a line's quantity; anything below one is raised to one.
    pub fn set_quantity(&mut self, product_id: Uuid, selection: &Selection, quantity: u32) -> Result<(), CartError> {
        let item = self.items.iter_mut().find(|i| i.is(product_id, selection)).ok_or(CartError::ItemNotFound)?;
        item.quantity = quantity.max(1);
        Ok(())
    }

    pub fn remove(&mut self, product_id: Uuid, selection: &Selection) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.is(product_id, selection));
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        Ok(())
    }

    pub fn subtotal(&self) -> Money { self.items.iter().map(CartItem::line_total).sum() }

    pub fn clear(&mut self) { self.items.clear(); }

    pub fn into_items(self) -> Vec<CartItem> { self.items }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Only {available} items of {name} available in stock")]
    StockLimit { name: String, available: u32 },
    #[error(transparent)]
    Product(#[from] ProductError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::{draft, rice};

    #[test]
    fn test_cart_operations() {
        let milk = Product::create(draft("Milk", 50, 10)).unwrap();
        let mut cart = Cart::new();
        cart.add(&milk, Selection::Base).unwrap();
        cart.add(&milk, Selection::Base).unwrap();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items()[0].quantity, 2); // Merged
        assert_eq!(cart.subtotal(), Money::from(100));
    }

    #[test]
    fn test_variants_are_distinct_lines() {
        let rice = rice();
        let mut cart = Cart::new();
        cart.add(&rice, Selection::variant("1kg")).unwrap();
        cart.add(&rice, Selection::variant("5kg")).unwrap();
        cart.add(&rice, Selection::variant("1kg")).unwrap();
        assert_eq!(cart.line_count(), 2);
        // 1kg snapshots the discounted price
        assert_eq!(cart.subtotal(), Money::from(110 * 2 + 550));
        cart.remove(rice.id, &Selection::variant("1kg")).unwrap();
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.remove(rice.id, &Selection::variant("1kg")), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_add_bounded_by_known_stock() {
        let eggs = Product::create(draft("Eggs", 6, 2)).unwrap();
        let mut cart = Cart::new();
        cart.add(&eggs, Selection::Base).unwrap();
        cart.add(&eggs, Selection::Base).unwrap();
        assert_eq!(cart.add(&eggs, Selection::Base).unwrap_err(), CartError::StockLimit { name: "Eggs".into(), available: 2 });
        let sold_out = Product::create(draft("Bread", 40, 0)).unwrap();
        assert!(cart.add(&sold_out, Selection::Base).is_err());
    }

    #[test]
    fn test_set_quantity_clamps_to_one() {
        let milk = Product::create(draft("Milk", 50, 10)).unwrap();
        let mut cart = Cart::new();
        cart.add(&milk, Selection::Base).unwrap();
        cart.set_quantity(milk.id, &Selection::Base, 0).unwrap();
        assert_eq!(cart.items()[0].quantity, 1);
        cart.set_quantity(milk.id, &Selection::Base, 4).unwrap();
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.set_quantity(milk.id, &Selection::variant("x"), 2), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_cart_item_quantity_bounds() {
        let json = r#"{"productId":"0190a5e0-0000-7000-8000-000000000001","name":"Milk","price":50,"quantity":1}"#;
        let mut item: CartItem = serde_json::from_str(json).unwrap();
        assert!(item.validate().is_ok());
        item.quantity = 0;
        assert!(item.validate().is_err());
        item.quantity = 10_001;
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_cart_item_wire_format() {
        let json = r#"{"productId":"0190a5e0-0000-7000-8000-000000000001","name":"Rice","price":110,"quantity":2,"variant":"1kg"}"#;
        let item: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.selection, Selection::variant("1kg"));
        assert_eq!(item.line_total(), Money::from(220));
        let plain: CartItem = serde_json::from_str(r#"{"productId":"0190a5e0-0000-7000-8000-000000000001","name":"Milk","price":50,"quantity":1}"#).unwrap();
        assert_eq!(plain.selection, Selection::Base);
        assert!(!serde_json::to_string(&plain).unwrap().contains("variant"));
    }
}
