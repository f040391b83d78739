use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Connection failed: {0}")]
    ConnectionError(String),

    #[error("Failed to fetch page: {0}")]
    FetchError(String),

    #[error("Text extraction failed: {0}")]
    ExtractionError(String),

    #[error("Page rendering failed: {0}")]
    RenderError(String),

    #[error("{0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    RequestError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ConnectionError(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ExtractionError(_) => StatusCode::BAD_REQUEST,
            AppError::RequestError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::FetchError(_)
            | AppError::RenderError(_)
            | AppError::LlmError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        response::error(status, self.to_string()).into_response()
    }
}

/// Transport failures that never reached the server become `Connection`,
/// everything else is a plain fetch failure.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            AppError::ConnectionError(err.to_string())
        } else {
            AppError::FetchError(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
