pub mod auth;
pub mod products;

use axum::{http::StatusCode, response::Response};
use serde_json::json;

use crate::{error::AppError, serializer::Format};

/// Service description for `GET /`.
pub async fn home(format: Format) -> Response {
    let info = json!({
        "message": "Products API",
        "endpoints": {
            "login": "POST /api/auth/login",
            "list_products": "GET /api/products",
            "get_product": "GET /api/products/{id}",
            "search_products": "GET /api/products/search?name=<term>",
            "create_product": "POST /api/products",
            "update_product": "PUT /api/products/{id}",
            "delete_product": "DELETE /api/products/{id}",
        },
        "formats": ["json", "xml"],
        "authentication": {
            "type": "Bearer",
            "header": "Authorization: Bearer <token>",
            "login": "/api/auth/login",
        },
    });
    format.render(StatusCode::OK, &info)
}

pub async fn not_found(format: Format) -> Response {
    format.error(AppError::NotFound("Resource not found".to_string()))
}

pub async fn method_not_allowed(format: Format) -> Response {
    format.error(AppError::MethodNotAllowed)
}
