use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Response,
    Json,
};

use crate::{
    error::AppError,
    models::user::{AuthResponse, LoginPayload},
    serializer::Format,
    AppState,
};

pub async fn login(
    State(state): State<AppState>,
    format: Format,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Response {
    format.respond(StatusCode::OK, issue_for(&state, payload))
}

fn issue_for(
    state: &AppState,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<AuthResponse, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let (Some(username), Some(password)) = (
        payload.username.filter(|u| !u.is_empty()),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Username and password are required".to_string(),
        ));
    };

    state.credentials.authenticate(&username, &password)?;

    let issued = state.tokens.issue(&username)?;
    tracing::info!(subject = %username, "issued token");

    Ok(AuthResponse {
        message: "Login successful".to_string(),
        token: issued.token,
        expires_in: issued.claims.exp - issued.claims.iat,
    })
}
