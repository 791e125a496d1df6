//! Registration endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::error_response;
use crate::api::handlers::types::{ErrorResponse, MessageResponse, RegisterRequest, SendCodeRequest};
use crate::auth::{AuthService, AuthSuccess};

/// Send a registration code to an email address not yet held by a verified
/// account.
#[utoipa::path(
    post,
    path = "/api/auth/send-register-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Invalid email", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 502, description = "Delivery failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn send_register_code(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<SendCodeRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.request_register_code(&request.email).await {
        Ok(()) => Json(MessageResponse::new("Verification code sent")).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Complete registration with the emailed code; responds with a session
/// token and the public account projection.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthSuccess),
        (status = 400, description = "Invalid input or code", body = ErrorResponse),
        (status = 409, description = "Email or username taken", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service
        .register(
            &request.email,
            &request.code,
            request.password.as_deref(),
            request.username.as_deref(),
        )
        .await
    {
        Ok(success) => (StatusCode::CREATED, Json(success)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
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
    async fn send_register_code_missing_payload() {
        let response = send_register_code(Extension(service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn send_register_code_rejects_invalid_email() {
        let response = send_register_code(
            Extension(service()),
            Some(Json(SendCodeRequest {
                email: "not-an-email".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_with_unknown_code_is_rejected() -> Result<()> {
        let response = register(
            Extension(service()),
            Some(Json(RegisterRequest {
                email: "a@x.com".to_string(),
                code: "123456".to_string(),
                password: Some("secret123".to_string()),
                username: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
