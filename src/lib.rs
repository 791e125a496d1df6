//! # Chiave (Account Authentication & Verification)
//!
//! `chiave` is the authentication subsystem of the blog platform. It owns
//! account registration and login (password or one-time email code),
//! password recovery via hashed reset tokens, signed stateless sessions,
//! and role-based request authorization.
//!
//! ## Verification codes
//!
//! Short numeric codes are emailed for registration, login, and password
//! reset. A code is exact-match, time-boxed (`now == expires_at` is already
//! expired), and superseded by re-issue; the login and reset flows consume
//! it in the same store write that commits their effect.
//!
//! ## Sessions
//!
//! Sessions are compact HS256 tokens carrying only the account id and
//! expiry. There is no server-side session state and no revocation list;
//! expiry is the only invalidation.
//!
//! ## Secrets at rest
//!
//! Passwords are stored as argon2id PHC strings, reset tokens as SHA-256
//! digests. The account record is not serializable; handlers return the
//! `PublicUser` and `Profile` projections instead.

pub mod api;
pub mod auth;
pub mod cli;
pub mod email;
pub mod store;
