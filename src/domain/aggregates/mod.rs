//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod coupon;
pub mod category;
pub mod admin;

pub use product::{Product, ProductDraft, ProductError, ProductFilter, Selection, Variant};
pub use order::{Customer, Delivery, DeliveryOption, Order, OrderError, OrderItem, OrderStatus, Totals};
pub use cart::{Cart, CartError, CartItem};
pub use coupon::{AppliedCoupon, Coupon, CouponError, DiscountType, NewCoupon};
pub use category::{Category, CategoryDraft};
pub use admin::{Admin, NewAdmin, Role};
