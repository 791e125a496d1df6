//! Authentication flows: registration, login, password reset.
//!
//! The service owns no state beyond its collaborators; every flow is a
//! load-check-mutate-save sequence against the store. Codes and reset
//! material are only persisted after email delivery succeeds, so a failed
//! send leaves no half-committed record behind.

use std::sync::Arc;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::config::AuthConfig;
use super::error::AuthError;
use super::password::{hash_password, verify_password};
use super::session::SessionIssuer;
use super::verification::{
    check_code, clear_code, clear_reset_token, issue_code, issue_reset_token, reset_token_digest,
};
use crate::email::{CodePurpose, EmailSender};
use crate::store::{PublicUser, User, UserStore};

const PASSWORD_MIN_LENGTH: usize = 6;
const USERNAME_MIN_LENGTH: usize = 3;
const USERNAME_MAX_LENGTH: usize = 20;

/// Successful registration, login, or reset outcome.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AuthSuccess {
    pub token: String,
    pub user: PublicUser,
}

/// Lowercase and trim; two spellings of the same address are one account.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    if valid_email(email) {
        Ok(())
    } else {
        Err(AuthError::InvalidInput("Invalid email address"))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(AuthError::InvalidInput(
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(AuthError::InvalidInput(
            "Username must be between 3 and 20 characters",
        ));
    }
    Ok(())
}

/// Fallback username when registration omits one; uniqueness is still
/// enforced by the store, a collision surfaces as `UsernameTaken`.
fn default_username(now_millis: i64) -> String {
    format!("user_{:06}", now_millis.rem_euclid(1_000_000))
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    mailer: Arc<dyn EmailSender>,
    sessions: SessionIssuer,
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn EmailSender>,
        config: AuthConfig,
    ) -> Self {
        let sessions = SessionIssuer::new(
            config.session_secret().clone(),
            config.session_ttl_seconds(),
            config.session_remember_ttl_seconds(),
        );
        Self {
            store,
            mailer,
            sessions,
            config,
        }
    }

    /// Send a registration code. Fails with `EmailTaken` only when a
    /// verified account already holds the address; an unverified placeholder
    /// just gets a fresh code, superseding the old one.
    pub async fn request_register_code(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        let now = Utc::now();

        let (mut user, is_new) = match self.store.find_by_email(&email).await? {
            Some(existing) if existing.verified => return Err(AuthError::EmailTaken),
            Some(existing) => (existing, false),
            None => (User::placeholder(email.clone(), now), true),
        };

        let code = issue_code(&mut user, &self.config, now)?;
        self.mailer
            .send_code(&email, &code, CodePurpose::Register)
            .map_err(|err| {
                info!(to_email = %email, error = %err, "code delivery failed");
                AuthError::DeliveryFailure
            })?;

        if is_new {
            self.store.create(user).await?;
        } else {
            self.store.save(&user).await?;
        }
        Ok(())
    }

    /// Complete registration: verify the code, set credentials, mark the
    /// account verified, and start a session. The password is optional; a
    /// code-only account keeps no hash until it chooses one through the
    /// reset flow.
    pub async fn register(
        &self,
        email: &str,
        code: &str,
        password: Option<&str>,
        username: Option<&str>,
    ) -> Result<AuthSuccess, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        if let Some(password) = password {
            validate_password(password)?;
        }
        if let Some(name) = username {
            validate_username(name)?;
        }
        let now = Utc::now();

        let mut user = match self.store.find_by_email(&email).await? {
            Some(existing) if existing.verified => return Err(AuthError::EmailTaken),
            Some(existing) => existing,
            None => return Err(AuthError::InvalidCode),
        };
        if !check_code(&user, code, now) {
            return Err(AuthError::InvalidCode);
        }

        user.username = Some(match username {
            Some(name) => name.to_string(),
            None => default_username(now.timestamp_millis()),
        });
        user.password_hash = password.map(hash_password).transpose()?;
        user.verified = true;
        clear_code(&mut user);
        self.store.save(&user).await?;

        info!(account = %user.id, "account registered");
        self.success(&user, false)
    }

    /// Send a login code to an existing verified account.
    pub async fn request_login_code(&self, email: &str) -> Result<(), AuthError> {
        self.send_code_to_verified(email, CodePurpose::Login).await
    }

    /// Log in with either a password or a one-time code; exactly one must be
    /// supplied. A consumed code is cleared in the same save that precedes
    /// the session mint, so replay loses the race by construction.
    pub async fn login(
        &self,
        email: &str,
        password: Option<&str>,
        code: Option<&str>,
        remember: bool,
    ) -> Result<AuthSuccess, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        let now = Utc::now();

        match (password, code) {
            (Some(password), None) => {
                // Missing account and wrong password are indistinguishable.
                let user = self
                    .store
                    .find_by_email(&email)
                    .await?
                    .filter(|u| u.verified)
                    .ok_or(AuthError::InvalidCredentials)?;
                let stored = user
                    .password_hash
                    .as_deref()
                    .ok_or(AuthError::InvalidCredentials)?;
                if !verify_password(password, stored) {
                    return Err(AuthError::InvalidCredentials);
                }
                self.success(&user, remember)
            }
            (None, Some(code)) => {
                let mut user = self
                    .store
                    .find_by_email(&email)
                    .await?
                    .filter(|u| u.verified)
                    .ok_or(AuthError::NotFound)?;
                if !check_code(&user, code, now) {
                    return Err(AuthError::InvalidCode);
                }
                clear_code(&mut user);
                self.store.save(&user).await?;
                self.success(&user, remember)
            }
            _ => Err(AuthError::InvalidInput(
                "Provide either a password or a verification code",
            )),
        }
    }

    /// Send a password reset code to an existing verified account.
    pub async fn request_reset_code(&self, email: &str) -> Result<(), AuthError> {
        self.send_code_to_verified(email, CodePurpose::Reset).await
    }

    /// Exchange a valid reset code for a single-use reset token. Only the
    /// token's digest is persisted; the raw value goes back to the caller.
    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        let now = Utc::now();

        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .filter(|u| u.verified)
            .ok_or(AuthError::NotFound)?;
        if !check_code(&user, code, now) {
            return Err(AuthError::InvalidCode);
        }
        let raw_token = issue_reset_token(&mut user, &self.config, now)?;
        self.store.save(&user).await?;
        Ok(raw_token)
    }

    /// Set a new password against a raw reset token. The token is consumed
    /// whether it arrived via the code exchange or a reset link.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<AuthSuccess, AuthError> {
        validate_password(new_password)?;
        let now = Utc::now();

        let mut user = self
            .store
            .find_by_reset_token_hash(&reset_token_digest(raw_token), now)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;
        user.password_hash = Some(hash_password(new_password)?);
        clear_reset_token(&mut user);
        clear_code(&mut user);
        self.store.save(&user).await?;

        info!(account = %user.id, "password reset");
        self.success(&user, false)
    }

    /// Change the password of a logged-in account; requires the current one.
    /// A fresh session token is minted, but previously issued tokens stay
    /// valid until natural expiry.
    pub async fn update_password(
        &self,
        account_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<AuthSuccess, AuthError> {
        validate_password(new_password)?;

        let mut user = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        let stored = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(current_password, stored) {
            return Err(AuthError::InvalidCredentials);
        }
        user.password_hash = Some(hash_password(new_password)?);
        self.store.save(&user).await?;

        info!(account = %user.id, "password updated");
        self.success(&user, false)
    }

    /// Resolve a bearer token into the live account record. Any token
    /// problem and any missing or unverified account collapse into
    /// `Unauthenticated`.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let account_id = self
            .sessions
            .verify(token)
            .map_err(|_| AuthError::Unauthenticated)?;
        self.store
            .find_by_id(account_id)
            .await?
            .filter(|u| u.verified)
            .ok_or(AuthError::Unauthenticated)
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.healthy().await
    }

    async fn send_code_to_verified(
        &self,
        email: &str,
        purpose: CodePurpose,
    ) -> Result<(), AuthError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        let now = Utc::now();

        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .filter(|u| u.verified)
            .ok_or(AuthError::NotFound)?;
        let code = issue_code(&mut user, &self.config, now)?;
        self.mailer.send_code(&email, &code, purpose).map_err(|err| {
            info!(to_email = %email, error = %err, "code delivery failed");
            AuthError::DeliveryFailure
        })?;
        self.store.save(&user).await?;
        Ok(())
    }

    fn success(&self, user: &User, remember: bool) -> Result<AuthSuccess, AuthError> {
        let token = self
            .sessions
            .issue(user.id, remember)
            .map_err(|err| AuthError::Internal(err.into()))?;
        Ok(AuthSuccess {
            token,
            user: user.public(),
        })
    }
}
