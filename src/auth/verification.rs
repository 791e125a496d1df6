//! Time-boxed verification codes and reset tokens on the account record.
//!
//! These operations mutate the in-memory record only; the caller persists
//! the record (and thereby consumes or supersedes the material) through the
//! store. `check_code` deliberately does not clear the code: the caller
//! clears and saves after acting on success, so a code is consumed in the
//! same write that commits its effect.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use super::codes::{generate_code, generate_reset_token};
use super::config::AuthConfig;
use crate::store::{User, VerificationCode};

/// Issue a fresh code on the account, superseding any prior one, and return
/// the raw code for delivery. Any outstanding reset token is dropped so at
/// most one kind of secret material is live per account.
///
/// # Errors
///
/// Returns an error only if the entropy source fails.
pub fn issue_code(user: &mut User, config: &AuthConfig, now: DateTime<Utc>) -> Result<String> {
    let code = generate_code(config.code_length())?;
    user.verification_code = Some(VerificationCode {
        code: code.clone(),
        expires_at: now + Duration::seconds(config.code_ttl_seconds()),
    });
    user.reset_token_hash = None;
    user.reset_token_expires_at = None;
    Ok(code)
}

/// Issue a reset token: persist only the digest and expiry on the record,
/// clear any pending verification code, and return the raw token.
///
/// # Errors
///
/// Returns an error only if the entropy source fails.
pub fn issue_reset_token(
    user: &mut User,
    config: &AuthConfig,
    now: DateTime<Utc>,
) -> Result<String> {
    let token = generate_reset_token()?;
    user.reset_token_hash = Some(reset_token_digest(&token));
    user.reset_token_expires_at = Some(now + Duration::seconds(config.reset_token_ttl_seconds()));
    user.verification_code = None;
    Ok(token)
}

/// True when a code exists, matches exactly, and is unexpired.
/// `now == expires_at` counts as expired.
#[must_use]
pub fn check_code(user: &User, submitted: &str, now: DateTime<Utc>) -> bool {
    user.verification_code
        .as_ref()
        .is_some_and(|pending| pending.code == submitted && now < pending.expires_at)
}

pub fn clear_code(user: &mut User) {
    user.verification_code = None;
}

pub fn clear_reset_token(user: &mut User) {
    user.reset_token_hash = None;
    user.reset_token_expires_at = None;
}

/// One-way digest of a raw reset token; the store only ever sees this.
#[must_use]
pub fn reset_token_digest(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
