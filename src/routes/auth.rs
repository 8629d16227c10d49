use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use crate::app::AppState;
use crate::auth::{self, AuthService};
use crate::error::Result;
use crate::extract::ValidJson;
use crate::models::auth::{AuthResponse, AuthSession, SigninRequest, SignupRequest};

/// Forwards `/api/auth/*` to the auth collaborator. Only GET and POST are
/// served there; other methods get a plain 404.
pub async fn auth_passthrough(State(state): State<AppState>, request: Request) -> Response {
    if ![Method::GET, Method::POST].contains(request.method()) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }
    state.auth.handle(request).await
}

/// Routes served by [`crate::auth::SessionAuth`].
pub fn router(service: AuthService) -> Router {
    Router::new()
        .route("/api/auth/sign-up/email", post(signup))
        .route("/api/auth/sign-in/email", post(signin))
        .route("/api/auth/sign-out", post(signout))
        .route("/api/auth/get-session", get(get_session))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not Found") })
        .with_state(service)
}

pub async fn signup(
    State(service): State<AuthService>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<SignupRequest>,
) -> Result<Response> {
    let (user, session) = service.sign_up(payload, auth::client_info(&headers)).await?;
    let cookie = auth::session_cookie(&session.token, service.session_ttl());

    Ok((
        [(SET_COOKIE, cookie)],
        Json(AuthResponse { token: session.token, user }),
    )
        .into_response())
}

pub async fn signin(
    State(service): State<AuthService>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<SigninRequest>,
) -> Result<Response> {
    let (user, session) = service.sign_in(payload, auth::client_info(&headers)).await?;
    let cookie = auth::session_cookie(&session.token, service.session_ttl());

    Ok((
        [(SET_COOKIE, cookie)],
        Json(AuthResponse { token: session.token, user }),
    )
        .into_response())
}

pub async fn signout(State(service): State<AuthService>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = auth::session_token(&headers) {
        service.sign_out(token).await?;
    }

    Ok((
        [(SET_COOKIE, auth::expired_session_cookie())],
        Json(json!({ "success": true })),
    )
        .into_response())
}

// Responds with `null` when there is no live session
pub async fn get_session(
    State(service): State<AuthService>,
    headers: HeaderMap,
) -> Result<Json<Option<AuthSession>>> {
    let session = match auth::session_token(&headers) {
        Some(token) => service.resolve(token).await?,
        None => None,
    };

    Ok(Json(session))
}
