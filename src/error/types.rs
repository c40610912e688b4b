use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use super::ExtractionError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("File too large: {size} bytes exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Request too large: upload exceeds limit of {limit} bytes")]
    RequestTooLarge { limit: usize },

    #[error("Too many files: {count} exceeds maximum batch size of {limit}")]
    BatchTooLarge { count: usize, limit: usize },

    #[error("Invalid upload: {message}")]
    InvalidFile { message: String },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Rate limit exceeded: maximum concurrent requests reached")]
    RateLimitExceeded,

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::RequestTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            AppError::InvalidFile { .. } => "INVALID_FILE",
            AppError::MissingFile => "MISSING_FILE",
            AppError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AppError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            AppError::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::BatchTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidFile { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::InvalidParameter { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::ExtractionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();
        let request_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        // Client mistakes are not server errors
        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                request_id = %request_id,
                error_message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "request_id": request_id,
                "timestamp": timestamp
            },
            "data": null
        }));

        (status, body).into_response()
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::ExtractionFailed {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(format!("IO error: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::internal(format!("Extraction task aborted: {}", err))
    }
}

impl AppError {
    pub fn invalid_file(message: impl Into<String>) -> Self {
        AppError::InvalidFile {
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        AppError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal {
            message: message.into(),
        }
    }
}
