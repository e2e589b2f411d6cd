use crate::error::Result;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let url = state.links().resolve(&short_code).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}
