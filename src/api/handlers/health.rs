//! Health endpoint.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthService;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store is reachable", body = Health),
        (status = 503, description = "Store is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    let healthy = service.store_healthy().await;
    let body = Health {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if healthy { "ok" } else { "unreachable" }.to_string(),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    use crate::auth::AuthConfig;
    use crate::email::LogEmailSender;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn memory_store_reports_healthy() {
        let config = AuthConfig::new(
            SecretString::from("test-secret"),
            "http://localhost:5173".to_string(),
        );
        let service = Arc::new(AuthService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogEmailSender),
            config,
        ));
        let response = health(Extension(service)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
