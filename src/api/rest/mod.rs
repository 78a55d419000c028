use axum::{routing::get, Router};

use crate::api::rest::{auth::router as auth_router, expenses::router as expenses_router};

pub mod auth;
pub mod expenses;
pub mod health;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health::healthcheck))
        .nest("/auth", auth_router())
        .nest("/expenses", expenses_router())
}
