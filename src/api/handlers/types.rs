//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub code: String,
    pub password: Option<String>,
    pub username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: Option<String>,
    pub code: Option<String>,
    #[serde(default)]
    pub remember: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResetVerifiedResponse {
    pub reset_token: String,
    pub message: String,
}

/// Error body: `kind` is machine-stable, `error` is for humans.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub kind: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_remember_defaults_to_false() -> Result<()> {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"a@x.com","password":"secret123"}"#)?;
        assert!(!request.remember);
        assert_eq!(request.code, None);
        Ok(())
    }

    #[test]
    fn update_password_request_uses_camel_case() -> Result<()> {
        let request: UpdatePasswordRequest = serde_json::from_str(
            r#"{"currentPassword":"old-secret","newPassword":"new-secret"}"#,
        )?;
        assert_eq!(request.current_password, "old-secret");
        assert_eq!(request.new_password, "new-secret");
        Ok(())
    }

    #[test]
    fn reset_verified_response_exposes_camel_case_token() -> Result<()> {
        let response = ResetVerifiedResponse {
            reset_token: "abc".to_string(),
            message: "Code verified".to_string(),
        };
        let value = serde_json::to_value(&response)?;
        value
            .get("resetToken")
            .and_then(serde_json::Value::as_str)
            .context("missing resetToken")?;
        Ok(())
    }
}
