//! Outbound delivery of one-time codes.
//!
//! The service hands each generated code to an [`EmailSender`]. The sender
//! decides how to deliver (SMTP, API, etc.) and returns `Ok`/`Err`; a
//! delivery failure fails the enclosing request, because the user has no
//! other way to learn the code. Delivery is attempted at most once per
//! request; transport-level retries are the caller's business.
//!
//! The default sender for local dev is `LogEmailSender`, which logs the code
//! and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

/// What the code being delivered is for; selects subject and wording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodePurpose {
    Register,
    Login,
    Reset,
}

impl CodePurpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Login => "login",
            Self::Reset => "reset",
        }
    }

    #[must_use]
    pub const fn subject(self) -> &'static str {
        match self {
            Self::Register => "Your registration code",
            Self::Login => "Your login code",
            Self::Reset => "Your password reset code",
        }
    }
}

/// Code delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a one-time code or return an error to fail the request.
    ///
    /// # Errors
    ///
    /// Returns an error when the message could not be handed to the
    /// underlying transport.
    fn send_code(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<()>;
}

/// Local dev sender that logs the code instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send_code(&self, email: &str, code: &str, purpose: CodePurpose) -> Result<()> {
        info!(
            to_email = %email,
            purpose = purpose.as_str(),
            subject = purpose.subject(),
            %code,
            "email delivery stub"
        );
        Ok(())
    }
}
