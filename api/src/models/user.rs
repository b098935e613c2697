use serde::{Deserialize, Serialize};

/// Login body. Both fields are optional so a missing one can be reported
/// as a 400 rather than a body rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    /// Seconds until the token stops verifying.
    pub expires_in: i64,
}

/// Identity attached to a request once the bearer token has verified.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub subject: String,
}
