use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shortlink_admission::AdmissionError;
use shortlink_service::LinkError;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Link(LinkError),
    Admission(AdmissionError),
    Unauthorized(&'static str),
    BadRequest(String),
}

impl From<LinkError> for AppError {
    fn from(err: LinkError) -> Self {
        AppError::Link(err)
    }
}

impl From<AdmissionError> for AppError {
    fn from(err: AdmissionError) -> Self {
        AppError::Admission(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Link(err) if err.is_validation() => (StatusCode::BAD_REQUEST, err.to_string()),
            AppError::Link(LinkError::NotFound) => {
                (StatusCode::NOT_FOUND, "Short link not found".to_string())
            }
            AppError::Link(LinkError::Expired) => {
                (StatusCode::GONE, "Short link has expired".to_string())
            }
            AppError::Link(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Admission(AdmissionError::RateLimited) => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            AppError::Admission(err) => {
                error!(error = %err, "admission control misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.to_string()),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
