use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{message, Json, Path};
use crate::auth::Caller;
use crate::domain::aggregates::{Admin, NewAdmin};
use crate::service::{AdminStatus, Storefront};
use crate::Result;

pub async fn status(State(s): State<Storefront>, caller: Option<Caller>) -> Result<Json<AdminStatus>> {
    Ok(Json(s.admin_status(caller.as_ref()).await?))
}

pub async fn list(State(s): State<Storefront>, caller: Option<Caller>) -> Result<Json<Vec<Admin>>> {
    Ok(Json(s.list_admins(caller.as_ref()).await?))
}

pub async fn add(State(s): State<Storefront>, caller: Caller, Json(new): Json<NewAdmin>) -> Result<(StatusCode, Json<Admin>)> {
    Ok((StatusCode::CREATED, Json(s.add_admin(Some(&caller), new).await?)))
}

pub async fn remove(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>> {
    s.remove_admin(Some(&caller), id).await?;
    Ok(message("Admin removed"))
}
