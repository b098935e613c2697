//! HTTP resource server for products: bearer-token guarded CRUD with
//! field validation and JSON or XML responses chosen per request.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rest;
pub mod serializer;
pub mod store;
pub mod validation;

use std::sync::Arc;

use axum::Router;

use crate::{
    auth::{CredentialStore, TokenService},
    store::ProductStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub tokens: TokenService,
    pub credentials: Arc<dyn CredentialStore>,
}

pub fn app(state: AppState) -> Router {
    rest::router(state)
}
