//! Caller identity.
//!
//! Authentication happens upstream: the identity proxy forwards the signed-in
//! user as `x-user-id` / `x-user-email`. A request without both is anonymous.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};

use crate::StorefrontError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub email: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), email: email.into() }
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|v| !v.is_empty()).map(String::from)
        };
        Some(Self { user_id: get(USER_ID_HEADER)?, email: get(USER_EMAIL_HEADER)? })
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers).ok_or(StorefrontError::Unauthorized)
    }
}
