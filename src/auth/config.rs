//! Authentication configuration.
//!
//! All knobs (signing secret, expiry windows, code length) live in one
//! structure built at startup and handed to the service and session issuer;
//! nothing reads the environment at request time.

use secrecy::SecretString;

const DEFAULT_CODE_LENGTH: usize = 6;
const DEFAULT_CODE_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_SESSION_REMEMBER_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_secret: SecretString,
    frontend_base_url: String,
    code_length: usize,
    code_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    session_ttl_seconds: i64,
    session_remember_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(session_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            session_secret,
            frontend_base_url,
            code_length: DEFAULT_CODE_LENGTH,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_remember_ttl_seconds: DEFAULT_SESSION_REMEMBER_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_code_length(mut self, length: usize) -> Self {
        self.code_length = length.max(4);
        self
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_remember_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_remember_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    #[must_use]
    pub fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_remember_ttl_seconds(&self) -> i64 {
        self.session_remember_ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            SecretString::from("test-secret"),
            "http://localhost:5173".to_string(),
        )
    }

    #[test]
    fn defaults_match_documented_windows() {
        let config = config();
        assert_eq!(config.code_length(), 6);
        assert_eq!(config.code_ttl_seconds(), 600);
        assert_eq!(config.reset_token_ttl_seconds(), 600);
        assert_eq!(config.session_ttl_seconds(), 7 * 24 * 60 * 60);
        assert_eq!(config.session_remember_ttl_seconds(), 30 * 24 * 60 * 60);
        assert_eq!(config.frontend_base_url(), "http://localhost:5173");
    }

    #[test]
    fn builders_override_and_clamp() {
        let config = config()
            .with_code_length(8)
            .with_code_ttl_seconds(120)
            .with_reset_token_ttl_seconds(60)
            .with_session_ttl_seconds(3600)
            .with_session_remember_ttl_seconds(7200);
        assert_eq!(config.code_length(), 8);
        assert_eq!(config.code_ttl_seconds(), 120);
        assert_eq!(config.reset_token_ttl_seconds(), 60);
        assert_eq!(config.session_ttl_seconds(), 3600);
        assert_eq!(config.session_remember_ttl_seconds(), 7200);

        // Codes shorter than 4 digits are trivially guessable.
        assert_eq!(self::config().with_code_length(2).code_length(), 4);
    }
}
