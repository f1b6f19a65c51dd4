//! Admin Aggregate
//!
//! Rows here grant catalog/order authority to additional staff. The super
//! admin is configured out-of-band and never stored as a row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub added_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NewAdmin {
    #[validate(email)]
    pub email: String,
}

impl Admin {
    pub fn grant(email: impl Into<String>, added_by: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), email: email.into(), added_by: added_by.into(), created_at: Utc::now() }
    }
}

/// Authority of a caller, strongest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role { SuperAdmin, Admin, Customer }

impl Role {
    pub fn is_admin(&self) -> bool { matches!(self, Self::SuperAdmin | Self::Admin) }
    pub fn is_super_admin(&self) -> bool { matches!(self, Self::SuperAdmin) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        assert!(Role::SuperAdmin.is_admin() && Role::SuperAdmin.is_super_admin());
        assert!(Role::Admin.is_admin() && !Role::Admin.is_super_admin());
        assert!(!Role::Customer.is_admin());
    }

    #[test]
    fn test_new_admin_validates_email() {
        assert!(NewAdmin { email: "staff@example.com".into() }.validate().is_ok());
        assert!(NewAdmin { email: "not-an-email".into() }.validate().is_err());
    }
}
