use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use super::{Json, Path};
use crate::auth::Caller;
use crate::domain::aggregates::Order;
use crate::service::{PlaceOrder, Storefront};
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: String,
}

pub async fn create(State(s): State<Storefront>, caller: Caller, Json(req): Json<PlaceOrder>) -> Result<(StatusCode, Json<Order>)> {
    Ok((StatusCode::CREATED, Json(s.place_order(Some(&caller), req).await?)))
}

pub async fn list(State(s): State<Storefront>, caller: Option<Caller>) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.list_orders(caller.as_ref()).await?))
}

pub async fn mine(State(s): State<Storefront>, caller: Option<Caller>) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.my_orders(caller.as_ref()).await?))
}

pub async fn get(State(s): State<Storefront>, caller: Option<Caller>, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    Ok(Json(s.get_order(caller.as_ref(), id).await?))
}

pub async fn set_status(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>, Json(update): Json<StatusUpdate>) -> Result<Json<Order>> {
    Ok(Json(s.set_order_status_named(Some(&caller), id, &update.status).await?))
}
