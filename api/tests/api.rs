//! End-to-end tests of the router against an in-memory SQLite store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use products_api::{
    auth::{InMemoryCredentials, SystemClock, TokenService},
    models::product::{NewProduct, Product, ProductPatch},
    store::{ProductStore, SqliteProductStore, StoreError, StoreResult},
    AppState,
};

const SECRET: &[u8] = b"integration-secret";

fn tokens() -> TokenService {
    TokenService::new(SECRET, chrono::Duration::hours(24), Arc::new(SystemClock))
}

fn state_with(store: Arc<dyn ProductStore>) -> AppState {
    AppState {
        store,
        tokens: tokens(),
        credentials: Arc::new(
            InMemoryCredentials::new()
                .with_user("admin", "admin123")
                .unwrap(),
        ),
    }
}

async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteProductStore::new(pool);
    store.migrate().await.unwrap();
    products_api::app(state_with(Arc::new(store)))
}

fn bearer() -> String {
    format!("Bearer {}", tokens().issue("admin").unwrap().token)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(resp: &Response) -> &str {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn seed(app: &Router, body: Value) -> Value {
    let resp = send(app, "POST", "/api/products", Some(&bearer()), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await
}

#[tokio::test]
async fn home_describes_the_api() {
    let app = test_app().await;
    let resp = send(&app, "GET", "/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let data = body_json(resp).await;
    assert!(data.get("message").is_some());
    assert!(data.get("endpoints").is_some());
    assert_eq!(data["authentication"]["type"], "Bearer");
}

#[tokio::test]
async fn login_issues_a_usable_token() {
    let app = test_app().await;
    let resp = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "admin123"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let data = body_json(resp).await;
    assert_eq!(data["message"], "Login successful");
    assert_eq!(data["expires_in"], 86_400);
    let token = data["token"].as_str().unwrap();
    assert_eq!(tokens().verify(token).unwrap(), "admin");

    let resp = send(
        &app,
        "POST",
        "/api/products",
        Some(&format!("Bearer {token}")),
        Some(json!({"name": "Auth Test Product", "price": 49.99, "stocks": 10})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn login_failures() {
    let app = test_app().await;

    let resp = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "admin", "password": "wrongpassword"})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(resp).await.get("error").is_some());

    for body in [json!({"username": "admin"}), json!({"username": "", "password": "x"}), json!({})] {
        let resp = send(&app, "POST", "/api/auth/login", None, Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn mutations_require_a_token() {
    let app = test_app().await;

    let resp = send(
        &app,
        "POST",
        "/api/products",
        None,
        Some(json!({"name": "Widget", "price": 9.99})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let data = body_json(resp).await;
    assert!(data["error"].as_str().unwrap().to_lowercase().contains("token"));

    let resp = send(&app, "PUT", "/api/products/1", None, Some(json!({"price": 99.99}))).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = send(&app, "DELETE", "/api/products/1", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    for auth in ["Bearer invalid_token_123", "Bearer", "Token abc"] {
        let resp = send(
            &app,
            "POST",
            "/api/products",
            Some(auth),
            Some(json!({"name": "Should Fail", "price": 49.99})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{auth}");
        let data = body_json(resp).await;
        assert!(data["error"].as_str().unwrap().to_lowercase().contains("token"));
    }

    // nothing reached the store
    let resp = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = test_app().await;
    let issued = tokens()
        .issue_at("admin", chrono::Utc::now() - chrono::Duration::hours(25))
        .unwrap();
    let resp = send(
        &app,
        "POST",
        "/api/products",
        Some(&format!("Bearer {}", issued.token)),
        Some(json!({"name": "Widget", "price": 9.99})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn auth_errors_follow_the_requested_format() {
    let app = test_app().await;
    let resp = send(&app, "DELETE", "/api/products/1?format=xml", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(content_type(&resp), "application/xml");
    let text = body_text(resp).await;
    assert!(text.starts_with("<response><error>"));
    assert!(text.to_lowercase().contains("token"));
}

#[tokio::test]
async fn create_with_token_defaults_stocks() {
    let app = test_app().await;
    let created = seed(&app, json!({"name": "Widget", "price": 9.99})).await;
    assert!(created["id"].as_i64().unwrap() > 0);
    assert_eq!(created["name"], "Widget");
    assert_eq!(created["price"], 9.99);
    assert_eq!(created["stocks"], 0);
    assert_eq!(created["description"], Value::Null);
}

#[tokio::test]
async fn crud_round_trip() {
    let app = test_app().await;
    let created = seed(
        &app,
        json!({
            "name": "CRUD Test Product",
            "description": "Testing CRUD operations",
            "price": 79.99,
            "stocks": 25
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let resp = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);

    let resp = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        Some(&bearer()),
        Some(json!({"name": "Updated CRUD Product", "price": 99.99})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["name"], "Updated CRUD Product");
    assert_eq!(updated["price"], 99.99);
    assert_eq!(updated["stocks"], 25);
    assert_eq!(updated["description"], "Testing CRUD operations");

    let resp = send(&app, "DELETE", &format!("/api/products/{id}"), Some(&bearer()), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["id"], id);

    let resp = send(&app, "GET", &format!("/api/products/{id}"), None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = test_app().await;
    let created = seed(&app, json!({"name": "Desk Lamp", "price": 20.0, "stocks": 3})).await;
    let id = created["id"].as_i64().unwrap();

    let resp = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        Some(&bearer()),
        Some(json!({"price": 35.99})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let data = body_json(resp).await;
    assert_eq!(data["price"], 35.99);
    assert_eq!(data["name"], "Desk Lamp");
    assert_eq!(data["stocks"], 3);
}

#[tokio::test]
async fn update_ordering() {
    let app = test_app().await;
    let created = seed(&app, json!({"name": "Cable", "price": 3.0})).await;
    let id = created["id"].as_i64().unwrap();

    let resp = send(
        &app,
        "PUT",
        "/api/products/999999",
        Some(&bearer()),
        Some(json!({"price": 99.99})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await.get("error").is_some());

    // a missing id wins over an empty update
    let resp = send(&app, "PUT", "/api/products/999999", Some(&bearer()), Some(json!({}))).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, "PUT", &format!("/api/products/{id}"), Some(&bearer()), Some(json!({}))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let msg = body_json(resp).await["error"].as_str().unwrap().to_string();
    assert!(msg.contains("No valid fields"));

    let resp = send(
        &app,
        "PUT",
        &format!("/api/products/{id}"),
        Some(&bearer()),
        Some(json!({"price": -1})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_missing_product() {
    let app = test_app().await;
    let resp = send(&app, "DELETE", "/api/products/999999", Some(&bearer()), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_failures_name_the_field() {
    let app = test_app().await;
    let cases = [
        (json!({"price": 50.0, "stocks": 10}), "name"),
        (json!({"name": "Test Product"}), "price"),
        (json!({"name": "Test", "price": -10.0}), "price"),
        (json!({"name": "Test", "price": 0}), "price"),
        (json!({"name": "Test", "price": "not-a-number"}), "price"),
        (json!({"name": "Test", "price": 50.0, "stocks": -5}), "stocks"),
        (json!({"name": "A".repeat(50), "price": 50.0}), "name"),
        (json!({"name": "Test", "description": "D".repeat(110), "price": 50.0}), "description"),
        (json!({"name": "   ", "price": 50.0}), "name"),
        (json!({}), "name"),
    ];
    for (body, field) in cases {
        let resp = send(&app, "POST", "/api/products", Some(&bearer()), Some(body.clone())).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{body}");
        let msg = body_json(resp).await["error"].as_str().unwrap().to_lowercase();
        assert!(msg.contains(field), "{body} gave {msg}");
    }

    let resp = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(body_json(resp).await, json!([]));
}

#[tokio::test]
async fn non_object_bodies_are_rejected() {
    let app = test_app().await;
    let resp = send(&app, "POST", "/api/products", Some(&bearer()), Some(json!([1, 2]))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(header::AUTHORIZATION, bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not valid json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await.get("error").is_some());
}

#[tokio::test]
async fn search_behaviour() {
    let app = test_app().await;
    seed(&app, json!({"name": "Mechanical Keyboard", "price": 89.0})).await;
    seed(&app, json!({"name": "Wireless Mouse", "price": 25.0})).await;

    for term in ["keyboard", "KEYBOARD", "key"] {
        let resp = send(&app, "GET", &format!("/api/products/search?name={term}"), None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let results = body_json(resp).await;
        let names: Vec<&str> = results
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Mechanical Keyboard"], "{term}");
    }

    let resp = send(&app, "GET", "/api/products/search?name=nonexistentproduct12345", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!([]));

    for uri in ["/api/products/search", "/api/products/search?name=", "/api/products/search?name=%20"] {
        let resp = send(&app, "GET", uri, None, None).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(body_json(resp).await.get("error").is_some());
    }

    let resp = send(&app, "GET", "/api/products/search?name=a&name=b", None, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());

    seed(&app, json!({"name": "Éclair Tin", "price": 12.0})).await;
    // É is %C3%89, é is %C3%A9
    for term in ["%C3%89CLAIR", "%C3%A9clair", "%C3%89clair"] {
        let resp = send(&app, "GET", &format!("/api/products/search?name={term}"), None, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let results = body_json(resp).await;
        assert_eq!(results.as_array().unwrap().len(), 1, "{term}");
        assert_eq!(results[0]["name"], "Éclair Tin");
    }

    let resp = send(&app, "GET", "/api/products/search?name=mouse&format=xml", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/xml");
    let text = body_text(resp).await;
    assert!(text.contains("<response><item>"));
    assert!(text.contains("<name>Wireless Mouse</name>"));
}

#[tokio::test]
async fn formats_are_negotiated_per_request() {
    let app = test_app().await;
    let created = seed(&app, json!({"name": "Keyboard", "price": 49.5, "stocks": 2})).await;
    let id = created["id"].as_i64().unwrap();

    let resp = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(content_type(&resp), "application/json");
    assert!(body_json(resp).await.is_array());

    let resp = send(&app, "GET", "/api/products?format=xml", None, None).await;
    assert_eq!(content_type(&resp), "application/xml");
    assert_eq!(
        body_text(resp).await,
        format!(
            "<response><item><id>{id}</id><name>Keyboard</name><description></description>\
             <price>49.5</price><stocks>2</stocks></item></response>"
        )
    );

    let resp = send(&app, "GET", &format!("/api/products/{id}?format=XML"), None, None).await;
    assert_eq!(content_type(&resp), "application/xml");
    assert!(body_text(resp).await.starts_with(&format!("<response><id>{id}</id>")));

    let resp = send(&app, "GET", &format!("/api/products/{id}?format=yaml"), None, None).await;
    assert_eq!(content_type(&resp), "application/json");

    let resp = send(&app, "GET", "/api/products/999999?format=xml", None, None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_text(resp).await,
        "<response><error>Product not found</error></response>"
    );
}

#[tokio::test]
async fn unknown_ids_and_routes_are_404() {
    let app = test_app().await;
    for uri in ["/api/products/abc", "/api/products/999999", "/api/nothing"] {
        let resp = send(&app, "GET", uri, None, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(body_json(resp).await.get("error").is_some());
    }
}

#[tokio::test]
async fn unsupported_methods_are_405_in_the_requested_format() {
    let app = test_app().await;
    let created = seed(&app, json!({"name": "Keyboard", "price": 49.5})).await;
    let id = created["id"].as_i64().unwrap();

    for (method, uri) in [
        ("PATCH", format!("/api/products/{id}")),
        ("DELETE", "/api/products".to_string()),
        ("POST", "/api/products/search".to_string()),
        ("GET", "/api/auth/login".to_string()),
    ] {
        let resp = send(&app, method, &uri, Some(&bearer()), None).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(content_type(&resp), "application/json");
        assert_eq!(body_json(resp).await, json!({"error": "Method not allowed"}));
    }

    let resp = send(&app, "PATCH", &format!("/api/products/{id}?format=xml"), None, None).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(content_type(&resp), "application/xml");
    assert!(body_text(resp).await.contains("<error>Method not allowed</error>"));
}

#[derive(Debug)]
struct UnreachableStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Connectivity(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl ProductStore for UnreachableStore {
    async fn create(&self, _product: &NewProduct) -> StoreResult<i64> {
        down()
    }
    async fn get(&self, _id: i64) -> StoreResult<Option<Product>> {
        down()
    }
    async fn list(&self) -> StoreResult<Vec<Product>> {
        down()
    }
    async fn search_by_name(&self, _term: &str) -> StoreResult<Vec<Product>> {
        down()
    }
    async fn update(&self, _id: i64, _patch: &ProductPatch) -> StoreResult<()> {
        down()
    }
    async fn delete(&self, _id: i64) -> StoreResult<()> {
        down()
    }
}

#[tokio::test]
async fn store_failures_surface_as_500() {
    let app = products_api::app(state_with(Arc::new(UnreachableStore)));

    let resp = send(&app, "GET", "/api/products", None, None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let msg = body_json(resp).await["error"].as_str().unwrap().to_string();
    assert_eq!(msg, sqlx::Error::PoolTimedOut.to_string());

    let resp = send(
        &app,
        "POST",
        "/api/products",
        Some(&bearer()),
        Some(json!({"name": "Widget", "price": 9.99})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // validation runs before the store is touched
    let resp = send(
        &app,
        "POST",
        "/api/products",
        Some(&bearer()),
        Some(json!({"name": "Widget", "price": 0})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
