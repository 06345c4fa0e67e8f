//! Authentication error types.

use rentora_core::error::RentoraError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("invalid or expired one-time code")]
    OtpInvalid,

    #[error("two-factor authentication is not enrolled for this user")]
    OtpNotEnrolled,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for RentoraError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::OtpInvalid => RentoraError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::OtpNotEnrolled => RentoraError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => RentoraError::Crypto(msg),
        }
    }
}
