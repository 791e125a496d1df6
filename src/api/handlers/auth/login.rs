//! Login endpoints: one-time code request and dual-mode login.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::error_response;
use crate::api::handlers::types::{ErrorResponse, LoginRequest, MessageResponse, SendCodeRequest};
use crate::auth::{AuthService, AuthSuccess};

/// Send a login code to an existing verified account.
#[utoipa::path(
    post,
    path = "/api/auth/send-login-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 404, description = "No verified account", body = ErrorResponse),
        (status = 502, description = "Delivery failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn send_login_code(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.request_login_code(&request.email).await {
        Ok(()) => Json(MessageResponse::new("Verification code sent")).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Log in with either a password or a one-time code. `remember` stretches
/// the session expiry.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthSuccess),
        (status = 400, description = "Invalid input or code", body = ErrorResponse),
        (status = 401, description = "Incorrect credentials", body = ErrorResponse),
        (status = 404, description = "No verified account for code login", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service
        .login(
            &request.email,
            request.password.as_deref(),
            request.code.as_deref(),
            request.remember,
        )
        .await
    {
        Ok(success) => Json(success).into_response(),
        Err(err) => error_response(&err),
    }
}
