//! Endpoints for the authenticated account itself.

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::auth::{error_response, principal::require_auth};
use super::types::{ErrorResponse, MessageResponse};
use crate::auth::AuthService;
use crate::store::Profile;

/// Return the authenticated account's profile projection.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    params(
        ("Authorization" = String, Header, description = "Bearer session token")
    ),
    responses(
        (status = 200, description = "Authenticated profile", body = Profile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn me(headers: HeaderMap, service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    match require_auth(&headers, &service).await {
        Ok(user) => Json(user.profile()).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Acknowledge logout. Sessions are stateless, so the client discards the
/// token; nothing is invalidated server-side.
#[utoipa::path(
    get,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    Json(MessageResponse::new("Logged out successfully"))
}
