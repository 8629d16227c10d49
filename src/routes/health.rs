use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthState,
}

// Always 200; the body reports whether the database answers
pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = match state.todos.ping().await {
        Ok(()) => HealthState::Ok,
        Err(err) => {
            tracing::warn!("healthcheck failed: {err}");
            HealthState::Error
        }
    };

    Json(HealthResponse { status })
}
