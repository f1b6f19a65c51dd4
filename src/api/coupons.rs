use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{message, Json, Path};
use crate::auth::Caller;
use crate::domain::aggregates::{AppliedCoupon, Coupon, CouponError, NewCoupon};
use crate::domain::value_objects::Money;
use crate::service::Storefront;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    order_total: Money,
}

#[derive(Serialize)]
struct Verified {
    valid: bool,
    #[serde(flatten)]
    coupon: AppliedCoupon,
}

#[derive(Serialize)]
struct Rejected {
    valid: bool,
    message: String,
}

pub async fn list(State(s): State<Storefront>) -> Result<Json<Vec<Coupon>>> {
    Ok(Json(s.list_coupons().await?))
}

pub async fn create(State(s): State<Storefront>, caller: Caller, Json(new): Json<NewCoupon>) -> Result<(StatusCode, Json<Coupon>)> {
    Ok((StatusCode::CREATED, Json(s.create_coupon(Some(&caller), new).await?)))
}

pub async fn remove(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>> {
    s.delete_coupon(Some(&caller), id).await?;
    Ok(message("Coupon deleted"))
}

pub async fn verify(State(s): State<Storefront>, Json(req): Json<VerifyRequest>) -> Result<Response> {
    let response = match s.verify_coupon(req.code.as_deref(), req.order_total).await? {
        Ok(coupon) => Json(Verified { valid: true, coupon }).into_response(),
        Err(reason) => {
            let status = match reason {
                CouponError::Invalid => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(Rejected { valid: false, message: reason.to_string() })).into_response()
        }
    };
    Ok(response)
}
