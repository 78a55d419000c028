use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{infrastructure::repository::RepositoryError, validation::FieldErrors};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("owner {0} does not exist")]
    Referential(i64),
    #[error("invalid actor")]
    InvalidActor,
    #[error("conflict")]
    Conflict,
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Validation(_) | ServiceError::Referential(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::InvalidActor => StatusCode::BAD_REQUEST,
            ServiceError::Conflict => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for API responses; validation failures carry their
    /// field-keyed messages under `errors`.
    pub fn body(&self) -> Value {
        match self {
            ServiceError::Validation(errors) => {
                json!({ "error": self.to_string(), "errors": errors })
            }
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::MissingOwner(owner_id) => ServiceError::Referential(owner_id),
            RepositoryError::DuplicateUsername(_) => ServiceError::Conflict,
            RepositoryError::Database(err) => ServiceError::Internal(err.to_string()),
        }
    }
}
