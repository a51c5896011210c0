use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{auth::password::PasswordError, users::repo::StoreError, validation::FieldErrors};

/// Every failure a handler can return. Rendered as `{"errors": {...}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0} has already been taken")]
    Taken(&'static str),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("email or password is invalid")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody(_) | Self::Validation(_) | Self::Taken(_) | Self::Hashing(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::InvalidCredentials => StatusCode::FORBIDDEN,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::Taken(field) => json!({ "errors": { *field: ["has already been taken"] } }),
            Self::Internal(_) => json!({ "errors": { "body": ["internal server error"] } }),
            other => json!({ "errors": { "body": [other.to_string()] } }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(e) = &self {
            error!(error = ?e, "internal error");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => Self::Taken(field),
            StoreError::NotFound => Self::Unauthenticated("user not found"),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Hash(msg) => Self::Hashing(msg),
            other => Self::Internal(other.into()),
        }
    }
}
