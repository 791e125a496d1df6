//! Password reset and change endpoints.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{error_response, principal::require_auth};
use crate::api::handlers::types::{
    ErrorResponse, ForgotPasswordRequest, MessageResponse, ResetPasswordRequest,
    ResetVerifiedResponse, SendCodeRequest, UpdatePasswordRequest,
};
use crate::auth::{AuthService, AuthSuccess};

/// Send a password reset code to an existing verified account.
#[utoipa::path(
    post,
    path = "/api/auth/send-reset-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 404, description = "No verified account", body = ErrorResponse),
        (status = 502, description = "Delivery failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn send_reset_code(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.request_reset_code(&request.email).await {
        Ok(()) => Json(MessageResponse::new("Verification code sent")).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Exchange a valid reset code for a single-use reset token.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Code verified", body = ResetVerifiedResponse),
        (status = 400, description = "Invalid or expired code", body = ErrorResponse),
        (status = 404, description = "No verified account", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service
        .verify_reset_code(&request.email, &request.code)
        .await
    {
        Ok(reset_token) => Json(ResetVerifiedResponse {
            reset_token,
            message: "Code verified".to_string(),
        })
        .into_response(),
        Err(err) => error_response(&err),
    }
}

/// Set a new password against the raw reset token from `forgot-password`.
/// Responds with a fresh session so the client stays logged in.
#[utoipa::path(
    put,
    path = "/api/auth/reset-password/{reset_token}",
    params(
        ("reset_token" = String, Path, description = "Raw reset token")
    ),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = AuthSuccess),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    service: Extension<Arc<AuthService>>,
    Path(reset_token): Path<String>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.reset_password(&reset_token, &request.password).await {
        Ok(success) => Json(success).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Change the password of the authenticated account; responds with a fresh
/// session token.
#[utoipa::path(
    put,
    path = "/api/auth/update-password",
    request_body = UpdatePasswordRequest,
    params(
        ("Authorization" = String, Header, description = "Bearer session token")
    ),
    responses(
        (status = 200, description = "Password updated", body = AuthSuccess),
        (status = 400, description = "Invalid new password", body = ErrorResponse),
        (status = 401, description = "Not authenticated or wrong current password", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn update_password(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    let user = match require_auth(&headers, &service).await {
        Ok(user) => user,
        Err(err) => return error_response(&err),
    };
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service
        .update_password(user.id, &request.current_password, &request.new_password)
        .await
    {
        Ok(success) => Json(success).into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use secrecy::SecretString;

    use crate::auth::AuthConfig;
    use crate::email::LogEmailSender;
    use crate::store::MemoryStore;

    fn service() -> Arc<AuthService> {
        let config = AuthConfig::new(
            SecretString::from("test-secret"),
            "http://localhost:5173".to_string(),
        );
        Arc::new(AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogEmailSender),
            config,
        ))
    }

    #[tokio::test]
    async fn reset_password_with_unknown_token_is_rejected() {
        let response = reset_password(
            Extension(service()),
            Path("deadbeef".repeat(5)),
            Some(Json(ResetPasswordRequest {
                password: "new-secret".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_password_requires_authentication() {
        let response = update_password(
            HeaderMap::new(),
            Extension(service()),
            Some(Json(UpdatePasswordRequest {
                current_password: "old".to_string(),
                new_password: "new-secret".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn forgot_password_missing_payload() {
        let response = forgot_password(Extension(service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
