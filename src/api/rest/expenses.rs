use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::{
    domain::models::{ExpenseChanges, ExpenseDraft},
    infrastructure::{auth::AuthenticatedUser, state::AppState},
    services::{errors::ServiceError, expenses::ExpenseService},
};

type ApiResult<T> = Result<T, (StatusCode, Json<serde_json::Value>)>;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route(
            "/:id",
            get(show_expense)
                .patch(update_expense)
                .delete(delete_expense),
        )
}

async fn list_expenses(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<serde_json::Value>> {
    let service = ExpenseService::new(state.repositories.clone());
    let expenses = service
        .list_expenses_for(&user)
        .await
        .map_err(to_response)?;
    Ok(Json(serde_json::json!({ "expenses": expenses })))
}

async fn create_expense(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<ExpenseDraft>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let service = ExpenseService::new(state.repositories.clone());
    let expense = service
        .create_expense(&user, payload)
        .await
        .map_err(to_response)?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "expense": expense })),
    ))
}

async fn show_expense(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let service = ExpenseService::new(state.repositories.clone());
    let expense = service.get_expense(&user, id).await.map_err(to_response)?;
    let owner = service.owner_of(&expense).await.map_err(to_response)?;
    Ok(Json(serde_json::json!({ "expense": expense, "owner": owner })))
}

async fn update_expense(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(changes): Json<ExpenseChanges>,
) -> ApiResult<Json<serde_json::Value>> {
    let service = ExpenseService::new(state.repositories.clone());
    let expense = service
        .update_expense(&user, id, changes)
        .await
        .map_err(to_response)?;
    Ok(Json(serde_json::json!({ "expense": expense })))
}

async fn delete_expense(
    Extension(state): Extension<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let service = ExpenseService::new(state.repositories.clone());
    service
        .delete_expense(&user, id)
        .await
        .map_err(to_response)?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_response(err: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    (err.status_code(), Json(err.body()))
}
