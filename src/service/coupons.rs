use uuid::Uuid;

use super::Storefront;
use crate::auth::Caller;
use crate::domain::aggregates::{AppliedCoupon, Coupon, CouponError, NewCoupon};
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

/// Business outcome of a coupon check; storage failures travel separately.
pub type CouponCheck = std::result::Result<AppliedCoupon, CouponError>;

impl Storefront {
    pub async fn list_coupons(&self) -> Result<Vec<Coupon>> {
        self.store.list_coupons().await
    }

    pub async fn create_coupon(&self, caller: Option<&Caller>, new: NewCoupon) -> Result<Coupon> {
        self.require_admin(caller).await?;
        let coupon = Coupon::create(new)?;
        if self.store.coupon_code_exists(coupon.code.as_str()).await? {
            return Err(StorefrontError::validation("Coupon code already exists"));
        }
        self.store.insert_coupon(&coupon).await?;
        tracing::info!(code = %coupon.code, kind = coupon.discount_type.as_str(), "coupon created");
        Ok(coupon)
    }

    pub async fn delete_coupon(&self, caller: Option<&Caller>, id: Uuid) -> Result<()> {
        self.require_admin(caller).await?;
        if !self.store.delete_coupon(id).await? {
            return Err(StorefrontError::not_found("Coupon not found"));
        }
        Ok(())
    }

    /// Checks `code` against `subtotal`. Matches the stored code exactly and
    /// has no side effects; a coupon can be used until it is deactivated.
    pub async fn verify_coupon(&self, code: Option<&str>, subtotal: Money) -> Result<CouponCheck> {
        let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else { return Ok(Err(CouponError::Required)) };
        let check = match self.store.find_active_coupon(code).await? {
            Some(coupon) => coupon.apply(subtotal),
            None => Err(CouponError::Invalid),
        };
        match &check {
            Ok(applied) => tracing::debug!(%code, valid = true, discount = %applied.discount_amount, "coupon verified"),
            Err(reason) => tracing::debug!(%code, valid = false, %reason, "coupon rejected"),
        }
        Ok(check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::DiscountType;
    use crate::service::tests::{owner, shopper, storefront};
    use rust_decimal::Decimal;

    fn new_coupon(code: &str, kind: DiscountType, value: i64, min: i64) -> NewCoupon {
        NewCoupon { code: code.into(), discount_type: kind, discount_value: Decimal::from(value), min_order_amount: Money::from(min), is_active: true }
    }

    #[tokio::test]
    async fn test_verify_outcomes() {
        let shop = storefront();
        shop.create_coupon(Some(&owner()), new_coupon("save10", DiscountType::Percentage, 10, 0)).await.unwrap();
        shop.create_coupon(Some(&owner()), new_coupon("BIG50", DiscountType::Flat, 50, 500)).await.unwrap();

        let ok = shop.verify_coupon(Some("SAVE10"), Money::from(300)).await.unwrap().unwrap();
        assert_eq!(ok.discount_amount, Money::from(30));
        assert_eq!(shop.verify_coupon(None, Money::from(300)).await.unwrap(), Err(CouponError::Required));
        assert_eq!(shop.verify_coupon(Some(""), Money::from(300)).await.unwrap(), Err(CouponError::Required));
        assert_eq!(shop.verify_coupon(Some("   "), Money::from(300)).await.unwrap(), Err(CouponError::Required));
        assert_eq!(shop.verify_coupon(Some(" SAVE10 "), Money::from(300)).await.unwrap().unwrap().discount_amount, Money::from(30));
        // stored upper-case, matched as stored
        assert_eq!(shop.verify_coupon(Some("save10"), Money::from(300)).await.unwrap(), Err(CouponError::Invalid));
        assert_eq!(shop.verify_coupon(Some("BIG50"), Money::from(100)).await.unwrap(), Err(CouponError::BelowMinimum(Money::from(500))));
    }

    #[tokio::test]
    async fn test_inactive_coupon_is_invalid() {
        let shop = storefront();
        let mut c = new_coupon("OFF", DiscountType::Flat, 20, 0);
        c.is_active = false;
        shop.create_coupon(Some(&owner()), c).await.unwrap();
        assert_eq!(shop.verify_coupon(Some("OFF"), Money::from(100)).await.unwrap(), Err(CouponError::Invalid));
    }

    #[tokio::test]
    async fn test_create_requires_admin_and_unique_code() {
        let shop = storefront();
        let err = shop.create_coupon(Some(&shopper()), new_coupon("X", DiscountType::Flat, 1, 0)).await.unwrap_err();
        assert!(matches!(err, StorefrontError::Unauthorized));
        shop.create_coupon(Some(&owner()), new_coupon("X", DiscountType::Flat, 1, 0)).await.unwrap();
        let err = shop.create_coupon(Some(&owner()), new_coupon("x", DiscountType::Flat, 1, 0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Coupon code already exists");
    }
}
