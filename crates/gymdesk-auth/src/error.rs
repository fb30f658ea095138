//! Authentication error types.

use gymdesk_core::error::GymError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for GymError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => GymError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => GymError::Crypto(msg),
        }
    }
}
