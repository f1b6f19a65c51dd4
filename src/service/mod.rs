//! Storefront workflows, shared by the HTTP layer and tests.

use std::sync::Arc;

use crate::auth::Caller;
use crate::config::Config;
use crate::domain::aggregates::Role;
use crate::publisher::EventPublisher;
use crate::store::Store;
use crate::{Result, StorefrontError};

mod admins;
mod catalog;
mod coupons;
mod orders;

pub use admins::AdminStatus;
pub use coupons::CouponCheck;
pub use orders::PlaceOrder;

#[derive(Clone)]
pub struct Storefront {
    store: Arc<dyn Store>,
    config: Arc<Config>,
    events: EventPublisher,
}

impl Storefront {
    pub fn new(store: Arc<dyn Store>, config: Config, events: EventPublisher) -> Self {
        Self { store, config: Arc::new(config), events }
    }

    pub fn store(&self) -> &dyn Store { self.store.as_ref() }
    pub fn events(&self) -> &EventPublisher { &self.events }

    /// The configured super admin wins before the Admin table is consulted.
    pub async fn role_of(&self, caller: Option<&Caller>) -> Result<Role> {
        let Some(caller) = caller else { return Ok(Role::Customer) };
        if self.config.is_super_admin(&caller.email) {
            return Ok(Role::SuperAdmin);
        }
        Ok(match self.store.find_admin(&caller.email).await? {
            Some(_) => Role::Admin,
            None => Role::Customer,
        })
    }

    pub(crate) async fn require_admin(&self, caller: Option<&Caller>) -> Result<Role> {
        let role = self.role_of(caller).await?;
        if !role.is_admin() {
            tracing::debug!(email = ?caller.map(|c| &c.email), "admin action refused");
            return Err(StorefrontError::Unauthorized);
        }
        Ok(role)
    }

    pub(crate) fn require_super_admin<'a>(&self, caller: Option<&'a Caller>) -> Result<&'a Caller> {
        match caller {
            Some(c) if self.config.is_super_admin(&c.email) => Ok(c),
            _ => Err(StorefrontError::Unauthorized),
        }
    }
}
