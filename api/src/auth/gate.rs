//! Guard for routes that mutate products.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, MALFORMED_TOKEN, MISSING_TOKEN},
    models::user::AuthenticatedUser,
    serializer::Format,
    AppState,
};

/// Reject the request unless it carries a valid `Authorization: Bearer`
/// token. The verified subject is stored in request extensions.
pub async fn require_token(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let format = Format::from_uri(req.uri());

    let token = match extract_bearer_token(req.headers()) {
        Ok(token) => token,
        Err(err) => return format.error(err),
    };

    match state.tokens.verify(token) {
        Ok(subject) => {
            tracing::debug!(subject = %subject, "token accepted");
            req.extensions_mut().insert(AuthenticatedUser { subject });
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!("token rejected: {}", e);
            format.error(AppError::InvalidCredential)
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AppError::MissingCredential(MISSING_TOKEN))?
        .to_str()
        .map_err(|_| AppError::MissingCredential(MALFORMED_TOKEN))?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AppError::MissingCredential(MALFORMED_TOKEN)),
    }
}
