//! Bearer-token authentication and role checks for protected handlers.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::auth::{AuthError, AuthService};
use crate::store::{Role, User};

/// Pull the bearer token out of the Authorization header, if any.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the request's bearer token into the live account record.
///
/// Missing header, malformed token, bad signature, expiry, and a deleted or
/// unverified account all collapse into the same `Unauthenticated` error so
/// the response body reveals nothing about which check failed.
///
/// # Errors
///
/// Returns [`AuthError::Unauthenticated`] when no valid session is presented.
pub async fn require_auth(headers: &HeaderMap, service: &AuthService) -> Result<User, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::Unauthenticated)?;
    service.authenticate(token).await
}

/// Role allow-list check, composed after [`require_auth`].
///
/// # Errors
///
/// Returns [`AuthError::Forbidden`] when the account's role is not listed.
pub fn require_role(user: &User, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    #[test]
    fn bearer_token_parses_only_well_formed_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn role_allow_list_is_exact() {
        let mut user = User::placeholder("a@x.com".to_string(), Utc::now());
        assert!(require_role(&user, &[Role::User]).is_ok());
        assert!(require_role(&user, &[Role::User, Role::Admin]).is_ok());
        assert!(matches!(
            require_role(&user, &[Role::Admin]),
            Err(AuthError::Forbidden)
        ));

        user.role = Role::Admin;
        assert!(require_role(&user, &[Role::Admin]).is_ok());
        assert!(matches!(
            require_role(&user, &[Role::User]),
            Err(AuthError::Forbidden)
        ));
        assert!(matches!(require_role(&user, &[]), Err(AuthError::Forbidden)));
    }
}
