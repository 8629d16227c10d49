//! HTTP application composition.

use std::sync::Arc;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::AuthProvider;
use crate::database::TodoStore;
use crate::middleware::require_auth;
use crate::routes::{
    auth::auth_passthrough,
    health::healthcheck,
    todo::{create_todo, delete_todo, get_todo, list_todos, update_todo},
};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(todos: Arc<dyn TodoStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { todos, auth }
    }
}

async fn handle_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Builds the full router: public routes, the guarded todo resource,
/// CORS and request tracing.
pub fn router(state: AppState, allowed_origin: Option<HeaderValue>) -> Router {
    // Every todo route goes through the auth guard
    let todo_routes = Router::new()
        .route("/api/todo", get(list_todos).post(create_todo))
        .route("/api/todo/", get(list_todos).post(create_todo))
        .route(
            "/api/todo/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/healthcheck", get(healthcheck))
        .route("/api/auth/*path", any(auth_passthrough))
        .merge(todo_routes)
        .fallback(handle_404)
        .with_state(state)
        .layer(cors_layer(allowed_origin))
        .layer(TraceLayer::new_for_http())
}

/// A configured origin is allowed with credentials so the session cookie is
/// sent; without one any origin may call the API, credentials excluded.
pub fn cors_layer(allowed_origin: Option<HeaderValue>) -> CorsLayer {
    match allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}
