//! Access-control guard for protected routes.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::AppError;
use crate::models::auth::AuthSession;

/// Resolves the session behind a request and stores it in the request
/// extensions. Requests without a valid session stop here with 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth) = state.auth.get_session(request.headers()).await? else {
        tracing::debug!(path = %request.uri().path(), "rejected unauthenticated request");
        return Err(AppError::Unauthorized);
    };

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}

/// The authenticated principal, as attached by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthSession);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.user.id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                tracing::warn!("AuthSession not found in request extensions");
                AppError::Unauthorized
            })
    }
}
