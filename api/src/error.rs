use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::AuthError, serializer::Format, store::StoreError, validation::ValidationError,
};

pub const MISSING_TOKEN: &str = "Authentication token is missing";
pub const MALFORMED_TOKEN: &str = "Invalid token format. Use: Bearer <token>";
pub const PRODUCT_NOT_FOUND: &str = "Product not found";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    MissingCredential(&'static str),
    #[error("Invalid or expired token")]
    InvalidCredential,
    #[error("Invalid credentials")]
    LoginFail,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Connectivity(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential(_) | AppError::InvalidCredential | AppError::LoginFail => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Connectivity(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn product_not_found() -> Self {
        AppError::NotFound(PRODUCT_NOT_FOUND.to_string())
    }

    pub(crate) fn log(&self) {
        match self {
            AppError::Connectivity(e) => tracing::error!("Database error: {}", e),
            AppError::Internal(e) => tracing::error!("Internal error: {}", e),
            AppError::MissingCredential(_) | AppError::InvalidCredential | AppError::LoginFail => {
                tracing::warn!("Rejected credentials: {}", self)
            }
            _ => tracing::debug!("Request rejected: {}", self),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(inner: StoreError) -> Self {
        match inner {
            StoreError::NotFound => AppError::product_not_found(),
            StoreError::Connectivity(e) => AppError::Connectivity(e.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(inner: AuthError) -> Self {
        match inner {
            AuthError::InvalidCredentials => AppError::LoginFail,
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => AppError::InvalidCredential,
            AuthError::PasswordHash(e) => AppError::Internal(format!("Password hashing error: {e}")),
            AuthError::Jwt(e) => AppError::Internal(format!("Token error: {e}")),
        }
    }
}

/// Errors that escape without a negotiated format render as JSON.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        Format::Json.error(self)
    }
}
