//! HTTP surface: router assembly, middleware layers, and the serve loop.

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, warn, Span};
use ulid::Ulid;
use url::Url;

use crate::auth::{AuthConfig, AuthService};
use crate::email::LogEmailSender;
use crate::store::{MemoryStore, PgStore, UserStore};

pub mod handlers;
mod openapi;

pub use openapi::openapi;

use handlers::{auth, health, me};

/// Build the application router with the service attached.
#[must_use]
pub fn router(service: Arc<AuthService>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/openapi.json", get(openapi::serve))
        .route(
            "/api/auth/send-register-code",
            post(auth::register::send_register_code),
        )
        .route("/api/auth/register", post(auth::register::register))
        .route(
            "/api/auth/send-login-code",
            post(auth::login::send_login_code),
        )
        .route("/api/auth/login", post(auth::login::login))
        .route("/api/auth/logout", get(me::logout))
        .route("/api/auth/me", get(me::me))
        .route(
            "/api/auth/send-reset-code",
            post(auth::password::send_reset_code),
        )
        .route(
            "/api/auth/forgot-password",
            post(auth::password::forgot_password),
        )
        .route(
            "/api/auth/reset-password/:reset_token",
            put(auth::password::reset_password),
        )
        .route(
            "/api/auth/update-password",
            put(auth::password::update_password),
        )
        .layer(Extension(service))
}

/// Start the server.
///
/// Without a DSN the in-memory store backs the service; accounts then live
/// only as long as the process. Intended for local development.
///
/// # Errors
///
/// Returns an error if the database or listener cannot be set up.
pub async fn new(port: u16, dsn: Option<String>, auth_config: AuthConfig) -> Result<()> {
    let store: Arc<dyn UserStore> = match dsn {
        Some(dsn) => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(&dsn)
                .await
                .context("Failed to connect to database")?;
            let store = PgStore::new(pool);
            store.migrate().await.context("Failed to run migrations")?;
            Arc::new(store)
        }
        None => {
            warn!("No DSN configured, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let frontend_origin = frontend_origin(auth_config.frontend_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let service = Arc::new(AuthService::new(
        store,
        Arc::new(LogEmailSender),
        auth_config,
    ));

    let app = router(service).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_origin_strips_path_and_keeps_port() -> Result<()> {
        assert_eq!(
            frontend_origin("http://localhost:5173/app")?,
            HeaderValue::from_static("http://localhost:5173")
        );
        assert_eq!(
            frontend_origin("https://blog.example.com")?,
            HeaderValue::from_static("https://blog.example.com")
        );
        Ok(())
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
        assert!(frontend_origin("mailto:user@example.com").is_err());
    }
}
