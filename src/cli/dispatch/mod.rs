//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its full
//! configuration state.

use anyhow::{Context, Result};
use secrecy::SecretString;

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{
    ARG_CODE_LENGTH, ARG_CODE_TTL, ARG_DSN, ARG_FRONTEND_URL, ARG_PORT, ARG_RESET_TOKEN_TTL,
    ARG_SESSION_REMEMBER_TTL, ARG_SESSION_SECRET, ARG_SESSION_TTL,
};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches.get_one::<String>(ARG_DSN).cloned();
    let session_secret = matches
        .get_one::<String>(ARG_SESSION_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --session-secret")?;
    let frontend_base_url = matches
        .get_one::<String>(ARG_FRONTEND_URL)
        .cloned()
        .unwrap_or_else(|| "http://localhost:5173".to_string());

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret,
        frontend_base_url,
        code_length: matches
            .get_one::<usize>(ARG_CODE_LENGTH)
            .copied()
            .unwrap_or(6),
        code_ttl_seconds: matches.get_one::<i64>(ARG_CODE_TTL).copied().unwrap_or(600),
        reset_token_ttl_seconds: matches
            .get_one::<i64>(ARG_RESET_TOKEN_TTL)
            .copied()
            .unwrap_or(600),
        session_ttl_seconds: matches
            .get_one::<i64>(ARG_SESSION_TTL)
            .copied()
            .unwrap_or(604_800),
        session_remember_ttl_seconds: matches
            .get_one::<i64>(ARG_SESSION_REMEMBER_TTL)
            .copied()
            .unwrap_or(2_592_000),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn defaults_produce_a_memory_store_server_action() {
        temp_env::with_vars(
            [
                ("CHIAVE_SESSION_SECRET", Some("cli-secret")),
                ("CHIAVE_DSN", None::<&str>),
                ("CHIAVE_PORT", None),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["chiave"]);
                let Ok(Action::Server(args)) = handler(&matches) else {
                    panic!("expected server action");
                };
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, None);
                assert_eq!(args.session_secret.expose_secret(), "cli-secret");
                assert_eq!(args.frontend_base_url, "http://localhost:5173");
                assert_eq!(args.code_length, 6);
                assert_eq!(args.code_ttl_seconds, 600);
                assert_eq!(args.session_ttl_seconds, 604_800);
                assert_eq!(args.session_remember_ttl_seconds, 2_592_000);
            },
        );
    }

    #[test]
    fn flags_override_defaults() {
        temp_env::with_vars([("CHIAVE_SESSION_SECRET", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec![
                "chiave",
                "--port",
                "9000",
                "--dsn",
                "postgres://localhost/chiave",
                "--session-secret",
                "flag-secret",
                "--code-length",
                "8",
                "--code-ttl",
                "120",
            ]);
            let Ok(Action::Server(args)) = handler(&matches) else {
                panic!("expected server action");
            };
            assert_eq!(args.port, 9000);
            assert_eq!(args.dsn.as_deref(), Some("postgres://localhost/chiave"));
            assert_eq!(args.code_length, 8);
            assert_eq!(args.code_ttl_seconds, 120);
        });
    }
}
