//! Authentication collaborator.
//!
//! The rest of the application only depends on [`AuthProvider`]: it can
//! resolve the `{user, session}` behind a request, and it owns every route
//! under `/api/auth/`. [`SessionAuth`] is the database-backed implementation
//! with email/password accounts and opaque session tokens.
//!
//! A token is accepted from the `session_token` cookie or from an
//! `Authorization: Bearer <token>` header.

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{
        header::{AUTHORIZATION, COOKIE, USER_AGENT},
        HeaderMap,
    },
    response::Response,
    Router,
};
use chrono::Duration;
use tower::ServiceExt;

use crate::database::{auth::ClientInfo, AuthRepository, Database};
use crate::error::Result;
use crate::models::auth::AuthSession;

pub mod password;
pub mod service;

pub use service::AuthService;

pub const SESSION_COOKIE: &str = "session_token";

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolves the authenticated principal of a request, or `None`.
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>>;

    /// Serves a request addressed to `/api/auth/*`.
    async fn handle(&self, request: Request) -> Response;
}

/// Database-backed sessions with email/password sign-in.
#[derive(Clone)]
pub struct SessionAuth {
    service: AuthService,
    routes: Router,
}

impl SessionAuth {
    pub fn new(db: Database, session_ttl: Duration) -> Self {
        let service = AuthService::new(AuthRepository::new(db), session_ttl);
        let routes = crate::routes::auth::router(service.clone());
        Self { service, routes }
    }
}

#[async_trait]
impl AuthProvider for SessionAuth {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>> {
        match session_token(headers) {
            Some(token) => self.service.resolve(token).await,
            None => Ok(None),
        }
    }

    async fn handle(&self, request: Request) -> Response {
        match self.routes.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

/// Session token presented by the client, bearer header first.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| cookie_value(headers, SESSION_COOKIE))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty());

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    ClientInfo { ip_address, user_agent }
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, max_age: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.num_seconds()
    )
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
