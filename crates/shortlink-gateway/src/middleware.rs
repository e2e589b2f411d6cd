use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Rejects requests that do not carry a configured API key.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    match key {
        None => AppError::Unauthorized("API key required").into_response(),
        Some(key) if !state.is_known_api_key(key) => {
            debug!("rejected request with unknown API key");
            AppError::Unauthorized("Invalid API key").into_response()
        }
        Some(_) => next.run(request).await,
    }
}

/// Passes the request through the global token bucket.
pub async fn admit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.admission().try_admit() {
        Ok(()) => next.run(request).await,
        Err(err) => AppError::from(err).into_response(),
    }
}
