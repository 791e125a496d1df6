//! Account authentication: codes, passwords, sessions, and the service
//! orchestrating them.

pub mod codes;
pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod session;
pub mod verification;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, AuthSuccess};
pub use session::{SessionError, SessionIssuer};
