//! Error taxonomy for the authentication subsystem.
//!
//! Every variant is a normal business outcome reported to the caller with a
//! machine-stable kind; none is process-fatal. Store-connectivity loss and
//! entropy-source failure travel through `Internal` and terminate the
//! request instead of being retried.

use thiserror::Error;

use crate::store::{DuplicateField, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("Email is not registered or not verified")]
    NotFound,
    /// Covers both "no such account" and "wrong password" so the password
    /// path cannot be used to enumerate accounts.
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Verification code is invalid or expired")]
    InvalidCode,
    #[error("Reset token is invalid or expired")]
    InvalidOrExpiredToken,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Not authenticated, please log in")]
    Unauthenticated,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Failed to deliver the verification code")]
    DeliveryFailure,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Stable identifier for clients; the display message is for humans.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidCode => "invalid_code",
            Self::InvalidOrExpiredToken => "invalid_or_expired_token",
            Self::EmailTaken => "email_taken",
            Self::UsernameTaken => "username_taken",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::DeliveryFailure => "delivery_failure",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(DuplicateField::Email) => Self::EmailTaken,
            StoreError::Duplicate(DuplicateField::Username) => Self::UsernameTaken,
            StoreError::NotFound => Self::NotFound,
            StoreError::Backend(err) => Self::Internal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_store_errors_translate_to_user_facing_kinds() {
        let err: AuthError = StoreError::Duplicate(DuplicateField::Email).into();
        assert_eq!(err.kind(), "email_taken");
        let err: AuthError = StoreError::Duplicate(DuplicateField::Username).into();
        assert_eq!(err.kind(), "username_taken");
    }

    #[test]
    fn credentials_message_does_not_reveal_account_existence() {
        // Same kind and message whether the account is missing or the
        // password is wrong.
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Incorrect email or password"
        );
    }
}
