//! Error types for shelf-importer
//!
//! [`ImportError`] is the domain taxonomy raised by the import services;
//! [`ApiError`] is what HTTP handlers return.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::types::ProviderError;

/// Import domain errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// A book with the same code already exists in the target library
    #[error("{0}")]
    DuplicateCode(String),

    /// The addressed entity does not exist
    #[error("{0}")]
    IdDoesNotExist(String),

    /// An entity referenced from the request does not exist
    #[error("{0}")]
    RelationIdDoesNotExist(String),

    /// A referenced entity belongs to another library
    #[error("{0}")]
    RelationIsNotFromSameLibrary(String),

    #[error("User does not have access to the resource")]
    UserDoesNotHaveAccess,

    /// Provider call failed while fetching the book to import
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown user (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Domain error from the import services
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Import(ImportError::Database(err))
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Import(err) => match err {
                ImportError::DuplicateCode(msg) => (StatusCode::CONFLICT, "DUPLICATE_CODE", msg),
                ImportError::IdDoesNotExist(msg) => {
                    (StatusCode::NOT_FOUND, "ID_DOES_NOT_EXIST", msg)
                }
                ImportError::RelationIdDoesNotExist(msg) => {
                    (StatusCode::BAD_REQUEST, "RELATION_ID_DOES_NOT_EXIST", msg)
                }
                ImportError::RelationIsNotFromSameLibrary(msg) => (
                    StatusCode::BAD_REQUEST,
                    "RELATION_IS_NOT_FROM_SAME_LIBRARY",
                    msg,
                ),
                ImportError::UserDoesNotHaveAccess => (
                    StatusCode::FORBIDDEN,
                    "USER_DOES_NOT_HAVE_ACCESS",
                    ImportError::UserDoesNotHaveAccess.to_string(),
                ),
                ImportError::Provider(e) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", e.to_string()),
                ImportError::Database(e) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", e.to_string())
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
