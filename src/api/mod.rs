//! HTTP surface.

use axum::{http::StatusCode, response::{IntoResponse, Response}, routing::{delete, get, post}, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::Storefront;
use crate::StorefrontError;

mod admins;
mod catalog;
mod coupons;
mod extract;
mod orders;

pub use extract::{Json, Path};

pub fn router(shop: Storefront) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }))
        .route("/products", get(catalog::list_products).post(catalog::create_product))
        .route("/products/:id", get(catalog::get_product).put(catalog::update_product).delete(catalog::delete_product))
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/categories/:id", get(catalog::get_category).put(catalog::update_category).delete(catalog::delete_category))
        .route("/seed", post(catalog::seed))
        .route("/coupons", get(coupons::list).post(coupons::create))
        .route("/coupons/verify", post(coupons::verify))
        .route("/coupons/:id", delete(coupons::remove))
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/mine", get(orders::mine))
        .route("/orders/:id", get(orders::get).put(orders::set_status))
        .route("/admin/status", get(admins::status))
        .route("/admins", get(admins::list).post(admins::add))
        .route("/admins/:id", delete(admins::remove))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shop)
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Storage(msg) => {
                tracing::error!(error = %msg, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text }))
}
