use anyhow::Result;
use secrecy::SecretString;

use crate::api;
use crate::auth::AuthConfig;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub session_secret: SecretString,
    pub frontend_base_url: String,
    pub code_length: usize,
    pub code_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub session_ttl_seconds: i64,
    pub session_remember_ttl_seconds: i64,
}

/// Execute the server action.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new(args.session_secret, args.frontend_base_url)
        .with_code_length(args.code_length)
        .with_code_ttl_seconds(args.code_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_session_remember_ttl_seconds(args.session_remember_ttl_seconds);

    api::new(args.port, args.dsn, auth_config).await
}
