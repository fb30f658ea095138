//! GymDesk Auth: staff password authentication, EdDSA JWT issuance and
//! validation, and single-use refresh token rotation.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginInput, LoginOutput, RefreshInput};
pub use token::{AccessTokenClaims, ValidatedClaims};
