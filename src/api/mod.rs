use axum::{http::StatusCode, Json, Router};
use tower_http::trace::TraceLayer;

use self::rest::router as rest_router;

pub mod rest;

pub fn build_router() -> Router {
    Router::new()
        .nest("/api", rest_router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
}

pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "not_found"})),
    )
}
