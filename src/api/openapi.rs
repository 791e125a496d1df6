//! OpenAPI document assembled from the handler annotations.

use axum::response::Json;
use utoipa::openapi::{Contact, InfoBuilder, License, Tag};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health,
        crate::api::handlers::auth::register::send_register_code,
        crate::api::handlers::auth::register::register,
        crate::api::handlers::auth::login::send_login_code,
        crate::api::handlers::auth::login::login,
        crate::api::handlers::auth::password::send_reset_code,
        crate::api::handlers::auth::password::forgot_password,
        crate::api::handlers::auth::password::reset_password,
        crate::api::handlers::auth::password::update_password,
        crate::api::handlers::me::me,
        crate::api::handlers::me::logout,
    ),
    components(schemas(
        crate::api::handlers::types::SendCodeRequest,
        crate::api::handlers::types::RegisterRequest,
        crate::api::handlers::types::LoginRequest,
        crate::api::handlers::types::ForgotPasswordRequest,
        crate::api::handlers::types::ResetPasswordRequest,
        crate::api::handlers::types::UpdatePasswordRequest,
        crate::api::handlers::types::MessageResponse,
        crate::api::handlers::types::ResetVerifiedResponse,
        crate::api::handlers::types::ErrorResponse,
        crate::api::handlers::health::Health,
        crate::auth::AuthSuccess,
        crate::store::PublicUser,
        crate::store::Profile,
        crate::store::Role,
    ))
)]
struct ApiDoc;

/// Build the OpenAPI spec with Cargo.toml metadata instead of derive
/// defaults.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut api = ApiDoc::openapi();

    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    info.license = cargo_license();
    api.info = info;

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Account registration, login, and password recovery".to_string());
    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service liveness".to_string());
    api.tags = Some(vec![auth_tag, health_tag]);

    api
}

/// Serve the document, for clients and for generating typed frontends.
pub async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match (author.find('<'), author.rfind('>')) {
        (Some(start), Some(end)) if start < end => {
            let name = author[..start].trim();
            let email = author[start + 1..end].trim();
            (
                (!name.is_empty()).then_some(name),
                (!email.is_empty()).then_some(email),
            )
        }
        _ => ((!author.is_empty()).then_some(author), None),
    }
}

fn optional_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
