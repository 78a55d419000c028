use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    infrastructure::{
        auth::{credential_matches, issue_token},
        state::AppState,
    },
    services::errors::ServiceError,
};

pub fn router() -> Router {
    Router::new().route("/login", post(login))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    credential: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    token: String,
    is_admin: bool,
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<serde_json::Value>)> {
    if !credential_matches(&state.config.auth.developer_credential, &payload.credential) {
        return Err(unauthorized());
    }

    let user = state
        .repositories
        .users
        .find_user_by_username(&payload.username)
        .await
        .map_err(|err| to_response(ServiceError::from(err)))?;

    let Some(user) = user else {
        return Err(unauthorized());
    };

    let token = issue_token(&state, &user).map_err(to_response)?;
    info!(user_id = user.id, "issued session token");

    Ok(Json(LoginResponse {
        token,
        is_admin: user.is_admin,
    }))
}

fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "invalid_credentials" })),
    )
}

fn to_response(err: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    (err.status_code(), Json(err.body()))
}
