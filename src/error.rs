//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2102,
///     "message": "duplicate referral: user ... is already referred",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category             | HTTP Status                |
/// |-----------|----------------------|----------------------------|
/// | 1000–1999 | Validation           | 400 Bad Request            |
/// | 2000–2099 | Not Found / Auth     | 404 / 401                  |
/// | 2100–2199 | Conflict             | 409 Conflict               |
/// | 3000–3999 | Server               | 500 Internal Server Error  |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Referral action name is not one of the fixed enumerated actions.
    #[error("unknown referral action: {0}")]
    UnknownAction(String),

    /// Points event kind string is not recognized.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    /// Task type string is not recognized (canonical names or aliases).
    #[error("unknown task type: {0}")]
    UnknownTaskType(String),

    /// User with the given ID was not found.
    #[error("user not found: {0}")]
    UserNotFound(uuid::Uuid),

    /// Referral with the given ID was not found.
    #[error("referral not found: {0}")]
    ReferralNotFound(uuid::Uuid),

    /// Task with the given ID was not found.
    #[error("task not found: {0}")]
    TaskNotFound(uuid::Uuid),

    /// Missing or invalid session cookie / admin credential.
    #[error("unauthorized")]
    Unauthorized,

    /// Wallet address is already registered to another user.
    #[error("duplicate wallet address: {0}")]
    DuplicateWallet(String),

    /// Email is already registered to another user.
    #[error("duplicate email: {0}")]
    DuplicateEmail(String),

    /// The referred user already has a referral record.
    #[error("duplicate referral: user {0} is already referred")]
    DuplicateReferral(uuid::Uuid),

    /// A task of this type already exists for the user.
    #[error("duplicate task of type {0} for this user")]
    DuplicateTask(String),

    /// Task is already verified as completed.
    #[error("task already verified: {0}")]
    AlreadyVerified(uuid::Uuid),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnknownAction(_) => 1002,
            Self::UnknownEventKind(_) => 1003,
            Self::UnknownTaskType(_) => 1004,
            Self::UserNotFound(_) => 2001,
            Self::ReferralNotFound(_) => 2002,
            Self::TaskNotFound(_) => 2003,
            Self::Unauthorized => 2004,
            Self::DuplicateWallet(_) => 2101,
            Self::DuplicateEmail(_) => 2102,
            Self::DuplicateReferral(_) => 2103,
            Self::DuplicateTask(_) => 2104,
            Self::AlreadyVerified(_) => 2105,
            Self::PersistenceError(_) => 3001,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::UnknownAction(_)
            | Self::UnknownEventKind(_)
            | Self::UnknownTaskType(_) => StatusCode::BAD_REQUEST,
            Self::UserNotFound(_) | Self::ReferralNotFound(_) | Self::TaskNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::DuplicateWallet(_)
            | Self::DuplicateEmail(_)
            | Self::DuplicateReferral(_)
            | Self::DuplicateTask(_)
            | Self::AlreadyVerified(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
