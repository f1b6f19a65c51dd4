use axum::{extract::{Query, State}, http::StatusCode};
use uuid::Uuid;

use super::{message, Json, Path};
use crate::auth::Caller;
use crate::domain::aggregates::{Category, CategoryDraft, Product, ProductDraft, ProductFilter};
use crate::service::Storefront;
use crate::Result;

pub async fn list_products(State(s): State<Storefront>, Query(filter): Query<ProductFilter>) -> Result<Json<Vec<Product>>> {
    Ok(Json(s.list_products(&filter).await?))
}

pub async fn get_product(State(s): State<Storefront>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    Ok(Json(s.get_product(id).await?))
}

pub async fn create_product(State(s): State<Storefront>, caller: Caller, Json(draft): Json<ProductDraft>) -> Result<(StatusCode, Json<Product>)> {
    Ok((StatusCode::CREATED, Json(s.create_product(Some(&caller), draft).await?)))
}

pub async fn update_product(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>, Json(draft): Json<ProductDraft>) -> Result<Json<Product>> {
    Ok(Json(s.update_product(Some(&caller), id, draft).await?))
}

pub async fn delete_product(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>> {
    s.delete_product(Some(&caller), id).await?;
    Ok(message("Product deleted"))
}

pub async fn list_categories(State(s): State<Storefront>) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.list_categories().await?))
}

pub async fn get_category(State(s): State<Storefront>, Path(id): Path<Uuid>) -> Result<Json<Category>> {
    Ok(Json(s.get_category(id).await?))
}

pub async fn create_category(State(s): State<Storefront>, caller: Caller, Json(draft): Json<CategoryDraft>) -> Result<(StatusCode, Json<Category>)> {
    Ok((StatusCode::CREATED, Json(s.create_category(Some(&caller), draft).await?)))
}

pub async fn update_category(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>, Json(draft): Json<CategoryDraft>) -> Result<Json<Category>> {
    Ok(Json(s.update_category(Some(&caller), id, draft).await?))
}

pub async fn delete_category(State(s): State<Storefront>, caller: Caller, Path(id): Path<Uuid>) -> Result<Json<serde_json::Value>> {
    s.delete_category(Some(&caller), id).await?;
    Ok(message("Category deleted"))
}

pub async fn seed(State(s): State<Storefront>, caller: Caller) -> Result<Json<serde_json::Value>> {
    let inserted = s.seed_categories(Some(&caller)).await?;
    Ok(Json(serde_json::json!({ "message": "Default categories seeded successfully", "inserted": inserted })))
}
