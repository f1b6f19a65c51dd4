use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::Storefront;
use crate::auth::Caller;
use crate::domain::aggregates::{Admin, NewAdmin};
use crate::{Result, StorefrontError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatus {
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl Storefront {
    pub async fn admin_status(&self, caller: Option<&Caller>) -> Result<AdminStatus> {
        let role = self.role_of(caller).await?;
        Ok(AdminStatus { is_admin: role.is_admin(), is_super_admin: role.is_super_admin() })
    }

    pub async fn list_admins(&self, caller: Option<&Caller>) -> Result<Vec<Admin>> {
        self.require_super_admin(caller)?;
        self.store.list_admins().await
    }

    pub async fn add_admin(&self, caller: Option<&Caller>, new: NewAdmin) -> Result<Admin> {
        let granter = self.require_super_admin(caller)?;
        new.validate()?;
        let email = new.email.trim();
        if self.config.is_super_admin(email) {
            return Err(StorefrontError::validation("This email is already the Super Admin"));
        }
        if self.store.find_admin(email).await?.is_some() {
            return Err(StorefrontError::validation("Admin already exists"));
        }
        let admin = Admin::grant(email, granter.email.clone());
        self.store.insert_admin(&admin).await?;
        tracing::info!(email = %admin.email, added_by = %admin.added_by, "admin granted");
        Ok(admin)
    }

    pub async fn remove_admin(&self, caller: Option<&Caller>, id: Uuid) -> Result<()> {
        self.require_super_admin(caller)?;
        if !self.store.delete_admin(id).await? {
            return Err(StorefrontError::not_found("Admin not found"));
        }
        tracing::info!(admin_id = %id, "admin removed");
        Ok(())
    }
}
