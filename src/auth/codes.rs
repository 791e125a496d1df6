//! One-time code and reset token generation.
//!
//! Pure generation, no side effects. The only failure mode is the operating
//! system entropy source, which aborts the enclosing request.

use anyhow::{Context, Result};
use rand::{rngs::OsRng, RngCore};

/// Bytes of entropy in a raw reset token (160 bits, hex-encoded on output).
const RESET_TOKEN_BYTES: usize = 20;

/// Generate a fixed-length numeric code, uniform over digits.
///
/// Rejection sampling keeps the distribution flat; a plain `byte % 10`
/// would favor 0-5.
///
/// # Errors
///
/// Returns an error if the OS entropy source fails.
pub fn generate_code(length: usize) -> Result<String> {
    let mut digits = String::with_capacity(length);
    let mut buf = [0u8; 32];
    while digits.len() < length {
        OsRng
            .try_fill_bytes(&mut buf)
            .context("failed to draw entropy for verification code")?;
        for byte in buf {
            if byte < 250 {
                digits.push(char::from(b'0' + byte % 10));
                if digits.len() == length {
                    break;
                }
            }
        }
    }
    Ok(digits)
}

/// Generate a raw reset token: 20 random bytes, hex-encoded.
///
/// The raw value is returned to the requester once; only its digest is ever
/// persisted.
///
/// # Errors
///
/// Returns an error if the OS entropy source fails.
pub fn generate_reset_token() -> Result<String> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to draw entropy for reset token")?;
    Ok(hex::encode(bytes))
}
