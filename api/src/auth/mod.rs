//! Bearer-token authentication: credential lookup, token issuance and
//! verification, and the request guard for mutating routes.

pub mod credentials;
pub mod gate;
pub mod token;

use thiserror::Error;

pub use credentials::{CredentialStore, InMemoryCredentials};
pub use token::{Claims, Clock, IssuedToken, SystemClock, TokenService};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("password hashing error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}
