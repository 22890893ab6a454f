//! HTTP-facing error type.
//!
//! Protocol-level failures (the identity endpoint) answer with the error
//! object the client protocol expects; the middleware gates answer with the
//! plain-text bodies clients are used to.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::services::ServiceError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// 400 with the protocol error object.
    #[error("{0}")]
    BadRequest(String),

    /// 401 with the protocol error object (credential/session failures on
    /// the identity endpoint).
    #[error("{0}")]
    AuthFailed(String),

    /// 401 plain text (middleware gates).
    #[error("{0}")]
    Unauthorized(String),

    /// 403 plain text.
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(protocol_error(&message))).into_response()
            }
            ApiError::AuthFailed(message) => {
                (StatusCode::UNAUTHORIZED, Json(protocol_error(&message))).into_response()
            }
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, message).into_response()
            }
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ScopeNotSupported | ServiceError::Validation(_) => {
                ApiError::BadRequest(err.to_string())
            }
            ServiceError::InvalidCredentials
            | ServiceError::UserDisabled
            | ServiceError::UserNotVerified
            | ServiceError::InvalidGrant
            | ServiceError::InvalidToken(_) => ApiError::AuthFailed(err.to_string()),
            ServiceError::MembershipNotFound | ServiceError::LastOwner => {
                ApiError::BadRequest(err.to_string())
            }
            ServiceError::PermissionDenied(message) => ApiError::Forbidden(message.to_string()),
            ServiceError::Store(e) => ApiError::Internal(anyhow::Error::new(e)),
            ServiceError::Internal(e) => ApiError::Internal(e),
        }
    }
}

/// The error object shape the client protocol expects.
fn protocol_error(message: &str) -> serde_json::Value {
    serde_json::json!({
        "Message": message,
        "error": "",
        "error_description": "",
        "ValidationErrors": { "": [message] },
        "ErrorModel": {
            "Message": message,
            "Object": "error",
        },
        "ExceptionMessage": null,
        "ExceptionStackTrace": null,
        "InnerExceptionMessage": null,
        "Object": "error",
    })
}
