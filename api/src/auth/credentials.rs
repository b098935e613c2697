use std::collections::HashMap;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use super::AuthError;

/// Lookup of stored password hashes by username.
pub trait CredentialStore: Send + Sync {
    /// PHC-format Argon2 hash for `username`, if the user exists.
    fn lookup(&self, username: &str) -> Option<String>;

    fn authenticate(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let stored = self.lookup(username).ok_or(AuthError::InvalidCredentials)?;
        let parsed_hash = PasswordHash::new(&stored)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Fixed, process-local credential table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentials {
    users: HashMap<String, String>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash `password` and register it for `username`.
    pub fn with_user(mut self, username: &str, password: &str) -> Result<Self, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string();
        self.users.insert(username.to_string(), password_hash);
        Ok(self)
    }
}

impl CredentialStore for InMemoryCredentials {
    fn lookup(&self, username: &str) -> Option<String> {
        self.users.get(username).cloned()
    }
}
