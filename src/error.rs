use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of a generation, video or narrative call.
///
/// The three user-facing failures (`MissingCredential`, `InvalidCredential`
/// and `EmptyResult`) carry distinct codes so the front-end can tell
/// "enter a key", "your key is wrong" and "try again" apart.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("API key is required. Please enter your Gemini API key.")]
    MissingCredential,
    #[error("The Gemini API rejected the API key. Please check it and try again.")]
    InvalidCredential,
    #[error("Temporary upstream failure: {0}")]
    Transient(String),
    #[error("The model did not return any images. Please try again.")]
    EmptyResult,
    #[error("Job did not finish within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Generation job failed: {0}")]
    JobFailed(String),
    #[error("Unexpected response from the model: {0}")]
    MalformedUpstreamResponse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Could not read uploaded image: {0}")]
    Encoding(String),
}

impl GenerationError {
    fn status_and_code(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            GenerationError::MissingCredential => (StatusCode::UNAUTHORIZED, "authentication_error", "missing_api_key"),
            GenerationError::InvalidCredential => (StatusCode::UNAUTHORIZED, "authentication_error", "invalid_api_key"),
            GenerationError::Transient(_) => (StatusCode::BAD_GATEWAY, "upstream_error", "transient"),
            GenerationError::EmptyResult => (StatusCode::BAD_GATEWAY, "upstream_error", "empty_result"),
            GenerationError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error", "timeout"),
            GenerationError::JobFailed(_) => (StatusCode::BAD_GATEWAY, "upstream_error", "job_failed"),
            GenerationError::MalformedUpstreamResponse(_) => (StatusCode::BAD_GATEWAY, "upstream_error", "malformed_response"),
            GenerationError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", "invalid_request"),
            GenerationError::Encoding(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", "unreadable_image"),
        }
    }

    pub fn code(&self) -> &'static str {
        self.status_and_code().2
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: String,
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = self.status_and_code();
        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: error_type.to_string(),
                code: code.to_string(),
            },
        });
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
