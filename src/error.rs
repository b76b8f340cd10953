use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::FieldError;

/// Errors raised by the user and sweet stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("out of stock")]
    OutOfStock,

    #[error("conflict: {0}")]
    Conflict(String),

    /// The store refused a value, e.g. a quantity that would overflow.
    #[error("invalid: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Error type returned by every handler.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Out of stock")]
    OutOfStock,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(field: &str, message: &str) -> Self {
        Self::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound("Sweet not found".into()),
            StoreError::OutOfStock => Self::OutOfStock,
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Invalid(msg) => Self::invalid("quantity", &msg),
            StoreError::Database(e) => Self::Internal(anyhow::Error::new(e)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::OutOfStock => (StatusCode::BAD_REQUEST, "OUT_OF_STOCK"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        };

        let body = match self {
            Self::Validation(details) => ErrorResponse {
                error: "Validation failed".into(),
                code,
                details,
            },
            Self::Internal(e) => {
                error!(error = %e, "request failed");
                ErrorResponse {
                    error: "Internal server error".into(),
                    code,
                    details: Vec::new(),
                }
            }
            other => ErrorResponse {
                error: other.to_string(),
                code,
                details: Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_http_statuses() {
        let cases = [
            (StoreError::NotFound, StatusCode::NOT_FOUND),
            (StoreError::OutOfStock, StatusCode::BAD_REQUEST),
            (StoreError::Conflict("dup".into()), StatusCode::CONFLICT),
            (StoreError::Invalid("overflow".into()), StatusCode::BAD_REQUEST),
            (StoreError::Database(sqlx::Error::RowNotFound), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let res = AppError::from(err).into_response();
            assert_eq!(res.status(), status);
        }
    }

    #[test]
    fn auth_failures_are_distinct() {
        let unauth = AppError::Unauthorized("no token".into()).into_response();
        let forbidden = AppError::Forbidden("admin only".into()).into_response();
        assert_eq!(unauth.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    }
}
