//! Stateless session tokens.
//!
//! Compact HS256 JWTs carrying `{sub, iat, exp}`, signed with the
//! server-held secret. Verification needs no store access. There is no
//! revocation list: tokens issued before a password change stay valid until
//! natural expiry, so callers wanting immediate invalidation must
//! re-authenticate.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct SessionTokenHeader {
    alg: String,
    typ: String,
}

impl SessionTokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Failure modes are distinguishable here for logging; the HTTP boundary
/// collapses all of them into one unauthenticated response.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signing key")]
    Key,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid subject")]
    InvalidSubject,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, SessionError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, SessionError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| SessionError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Mints and verifies signed session tokens bound to an account id.
#[derive(Clone, Debug)]
pub struct SessionIssuer {
    secret: SecretString,
    ttl_seconds: i64,
    remember_ttl_seconds: i64,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(secret: SecretString, ttl_seconds: i64, remember_ttl_seconds: i64) -> Self {
        Self {
            secret,
            ttl_seconds,
            remember_ttl_seconds,
        }
    }

    /// Mint a token for the account; `remember` selects the long expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if claims cannot be encoded or the key is unusable.
    pub fn issue(&self, account_id: Uuid, remember: bool) -> Result<String, SessionError> {
        let ttl = if remember {
            self.remember_ttl_seconds
        } else {
            self.ttl_seconds
        };
        self.sign_at(account_id, ttl, Utc::now().timestamp())
    }

    /// Check signature then expiry and return the embedded account id.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for malformed, tampered, or expired tokens.
    pub fn verify(&self, token: &str) -> Result<Uuid, SessionError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub(crate) fn sign_at(
        &self,
        account_id: Uuid,
        ttl_seconds: i64,
        now_unix_seconds: i64,
    ) -> Result<String, SessionError> {
        let claims = SessionClaims {
            sub: account_id.to_string(),
            iat: now_unix_seconds,
            exp: now_unix_seconds + ttl_seconds,
        };
        let header_b64 = b64e_json(&SessionTokenHeader::hs256())?;
        let claims_b64 = b64e_json(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SessionError::Key)?;
        mac.update(signing_input.as_bytes());
        let signature_b64 = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    pub(crate) fn verify_at(
        &self,
        token: &str,
        now_unix_seconds: i64,
    ) -> Result<Uuid, SessionError> {
        let mut parts = token.split('.');
        let header_b64 = parts.next().ok_or(SessionError::TokenFormat)?;
        let claims_b64 = parts.next().ok_or(SessionError::TokenFormat)?;
        let sig_b64 = parts.next().ok_or(SessionError::TokenFormat)?;
        if parts.next().is_some() {
            return Err(SessionError::TokenFormat);
        }

        let header: SessionTokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(SessionError::UnsupportedAlg(header.alg));
        }

        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = Base64UrlUnpadded::decode_vec(sig_b64).map_err(|_| SessionError::Base64)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SessionError::Key)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| SessionError::InvalidSignature)?;

        // Signature first, then time: a forged token must never learn
        // whether its claims would have been acceptable.
        let claims: SessionClaims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds {
            return Err(SessionError::Expired);
        }

        Uuid::parse_str(&claims.sub).map_err(|_| SessionError::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn issuer(secret: &str) -> SessionIssuer {
        SessionIssuer::new(SecretString::from(secret), 7 * 24 * 3600, 30 * 24 * 3600)
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), SessionError> {
        let issuer = issuer("top-secret");
        let account_id = Uuid::new_v4();
        let token = issuer.sign_at(account_id, 3600, NOW)?;
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(issuer.verify_at(&token, NOW)?, account_id);
        Ok(())
    }

    #[test]
    fn expired_token_fails_even_with_valid_signature() -> Result<(), SessionError> {
        let issuer = issuer("top-secret");
        let token = issuer.sign_at(Uuid::new_v4(), 3600, NOW)?;
        // Boundary: exp == now is already expired.
        assert!(matches!(
            issuer.verify_at(&token, NOW + 3600),
            Err(SessionError::Expired)
        ));
        assert!(matches!(
            issuer.verify_at(&token, NOW + 9999),
            Err(SessionError::Expired)
        ));
        assert!(issuer.verify_at(&token, NOW + 3599).is_ok());
        Ok(())
    }

    #[test]
    fn wrong_secret_fails_signature_check() -> Result<(), SessionError> {
        let token = issuer("secret-a").sign_at(Uuid::new_v4(), 3600, NOW)?;
        assert!(matches!(
            issuer("secret-b").verify_at(&token, NOW),
            Err(SessionError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn tampered_claims_fail_signature_check() -> Result<(), SessionError> {
        let issuer = issuer("top-secret");
        let token = issuer.sign_at(Uuid::new_v4(), 3600, NOW)?;
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_claims = b64e_json(&SessionClaims {
            sub: Uuid::new_v4().to_string(),
            iat: NOW,
            exp: NOW + 999_999,
        })?;
        parts[1] = &forged_claims;
        let forged = parts.join(".");
        assert!(matches!(
            issuer.verify_at(&forged, NOW),
            Err(SessionError::InvalidSignature)
        ));
        Ok(())
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let issuer = issuer("top-secret");
        for junk in ["", "abc", "a.b", "a.b.c.d", "not a token at all"] {
            assert!(issuer.verify_at(junk, NOW).is_err(), "accepted {junk:?}");
        }
    }

    #[test]
    fn remember_mode_extends_expiry() -> Result<(), SessionError> {
        let issuer = SessionIssuer::new(SecretString::from("s"), 60, 3600);
        let short = issuer.sign_at(Uuid::new_v4(), 60, NOW)?;
        let long = issuer.sign_at(Uuid::new_v4(), 3600, NOW)?;
        assert!(matches!(
            issuer.verify_at(&short, NOW + 120),
            Err(SessionError::Expired)
        ));
        assert!(issuer.verify_at(&long, NOW + 120).is_ok());
        Ok(())
    }
}
