use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    auth::gate::require_token,
    handlers::{self, auth, products},
    AppState,
};

pub fn router(state: AppState) -> Router {
    let guard = from_fn_with_state(state.clone(), require_token);

    Router::new()
        .route("/", get(handlers::home).fallback(handlers::method_not_allowed))
        .route(
            "/api/auth/login",
            post(auth::login).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/products",
            get(products::index)
                .merge(post(products::create).route_layer(guard.clone()))
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/products/search",
            get(products::search).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/products/:id",
            get(products::show)
                .merge(
                    put(products::update)
                        .merge(delete(products::delete))
                        .route_layer(guard),
                )
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
