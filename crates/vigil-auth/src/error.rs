//! Authentication error types.

use chrono::{DateTime, Utc};
use thiserror::Error;
use vigil_core::error::VigilError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked")]
    AccountLocked { retry_at: DateTime<Utc> },

    #[error("invalid or expired reset token")]
    ResetTokenInvalid,

    #[error("password does not meet policy: {0}")]
    WeakPassword(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for VigilError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => VigilError::InvalidCredentials,
            AuthError::AccountLocked { retry_at } => VigilError::AccountLocked { retry_at },
            // The reset token is a credential; treat a bad one the same
            // as bad credentials.
            AuthError::ResetTokenInvalid => VigilError::InvalidCredentials,
            AuthError::WeakPassword(msg) => VigilError::Validation { message: msg },
            AuthError::Crypto(msg) => VigilError::Internal(msg),
        }
    }
}
