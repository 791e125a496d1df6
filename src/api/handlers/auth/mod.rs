//! Authentication route handlers.

pub mod login;
pub mod password;
pub mod principal;
pub mod register;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::error;

use super::types::ErrorResponse;
use crate::auth::AuthError;

/// Map a flow outcome onto status + `{kind, error}` body. Internal failures
/// are logged here and reported with a generic message.
pub fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::InvalidInput(_)
        | AuthError::InvalidCode
        | AuthError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::NotFound => StatusCode::NOT_FOUND,
        AuthError::EmailTaken | AuthError::UsernameTaken => StatusCode::CONFLICT,
        AuthError::DeliveryFailure => StatusCode::BAD_GATEWAY,
        AuthError::Internal(inner) => {
            error!("Request failed: {inner:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    kind: err.kind().to_string(),
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response();
        }
    };
    (
        status,
        Json(ErrorResponse {
            kind: err.kind().to_string(),
            error: err.to_string(),
        }),
    )
        .into_response()
}
