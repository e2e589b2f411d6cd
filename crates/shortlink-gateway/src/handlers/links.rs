use crate::error::{AppError, Result};
use crate::model::{CreateLinkRequest, CreateLinkResponse, LinkInfoResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub async fn create_link_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<Json<CreateLinkResponse>> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let created = state
        .links()
        .create(
            &request.original_url,
            request.expires_at.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(created.into()))
}

pub async fn get_link_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkInfoResponse>> {
    let record = state.links().get_info(&short_code).await?;
    Ok(Json(record.into()))
}

pub async fn delete_link_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.links().delete(&short_code).await?;
    Ok(StatusCode::NO_CONTENT)
}
