//! Product CRUD endpoints.
//!
//! Reads are public. Create, update and delete sit behind
//! [`require_token`](crate::auth::gate::require_token). Payloads are
//! validated before the store is touched, so a rejected request never
//! writes anything.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use serde_json::{Map, Value};

use crate::{
    error::AppError,
    models::{
        product::{DeletedProduct, Product, SearchParams},
        user::AuthenticatedUser,
    },
    serializer::Format,
    validation::{self, Mode},
    AppState,
};

type IdParam = Result<Path<i64>, PathRejection>;
type Body = Result<Json<Value>, JsonRejection>;

// non-numeric ids cannot name a product
fn product_id(id: IdParam) -> Result<i64, AppError> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::product_not_found())
}

fn json_object(body: Body) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(_) => Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(e) => Err(AppError::BadRequest(e.body_text())),
    }
}

pub async fn index(State(state): State<AppState>, format: Format) -> Response {
    let result = state.store.list().await.map_err(AppError::from);
    format.respond(StatusCode::OK, result)
}

pub async fn show(State(state): State<AppState>, format: Format, id: IdParam) -> Response {
    format.respond(StatusCode::OK, fetch(&state, id).await)
}

async fn fetch(state: &AppState, id: IdParam) -> Result<Product, AppError> {
    let id = product_id(id)?;
    state
        .store
        .get(id)
        .await?
        .ok_or_else(AppError::product_not_found)
}

pub async fn search(
    State(state): State<AppState>,
    format: Format,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    format.respond(StatusCode::OK, find(&state, params).await)
}

async fn find(
    state: &AppState,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Vec<Product>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match params.name.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => Ok(state.store.search_by_name(term).await?),
        _ => Err(AppError::BadRequest(
            "Search parameter 'name' is required".to_string(),
        )),
    }
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    format: Format,
    body: Body,
) -> Response {
    format.respond(StatusCode::CREATED, insert(&state, &user, body).await)
}

async fn insert(
    state: &AppState,
    user: &AuthenticatedUser,
    body: Body,
) -> Result<Product, AppError> {
    let payload = json_object(body)?;
    let product = validation::validate_new(&payload)?;

    let id = state.store.create(&product).await?;
    tracing::info!(id, name = %product.name, by = %user.subject, "product created");

    Ok(product.with_id(id))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    format: Format,
    id: IdParam,
    body: Body,
) -> Response {
    format.respond(StatusCode::OK, apply_update(&state, &user, id, body).await)
}

async fn apply_update(
    state: &AppState,
    user: &AuthenticatedUser,
    id: IdParam,
    body: Body,
) -> Result<Product, AppError> {
    let id = product_id(id)?;
    let payload = json_object(body)?;
    let patch = validation::validate(&payload, Mode::PartialUpdate)?;

    // existence is reported before an empty update
    if state.store.get(id).await?.is_none() {
        return Err(AppError::product_not_found());
    }
    if patch.is_empty() {
        return Err(AppError::BadRequest("No valid fields to update".to_string()));
    }

    state.store.update(id, &patch).await?;
    tracing::info!(id, by = %user.subject, "product updated");

    state
        .store
        .get(id)
        .await?
        .ok_or_else(AppError::product_not_found)
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    format: Format,
    id: IdParam,
) -> Response {
    format.respond(StatusCode::OK, remove(&state, &user, id).await)
}

async fn remove(
    state: &AppState,
    user: &AuthenticatedUser,
    id: IdParam,
) -> Result<DeletedProduct, AppError> {
    let id = product_id(id)?;
    state.store.delete(id).await?;
    tracing::info!(id, by = %user.subject, "product deleted");

    Ok(DeletedProduct {
        message: "Product deleted successfully".to_string(),
        id,
    })
}
