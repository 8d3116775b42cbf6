//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// Why a generation run stopped before rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The request never completed or came back with a non-success HTTP status
    NetworkFailure(String),
    /// The backend answered, but its envelope reported failure
    ApplicationFailure(String),
    /// The backend answered with a payload we could not decode
    Malformed(String),
    /// The generated image could not be fetched, decoded or re-encoded
    ImageLoadFailure(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkFailure(msg) => write!(f, "Network failure: {msg}"),
            Self::ApplicationFailure(msg) => write!(f, "Backend reported failure: {msg}"),
            Self::Malformed(msg) => write!(f, "Malformed backend response: {msg}"),
            Self::ImageLoadFailure(msg) => write!(f, "Failed to load image: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<image::ImageError> for PipelineError {
    fn from(err: image::ImageError) -> Self {
        PipelineError::ImageLoadFailure(err.to_string())
    }
}

/// Errors surfaced by the web application.
#[derive(Debug)]
pub enum CodebeastError {
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl From<std::io::Error> for CodebeastError {
    fn from(err: std::io::Error) -> Self {
        CodebeastError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for CodebeastError {
    fn from(err: axum::http::Error) -> Self {
        CodebeastError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for CodebeastError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CodebeastError::NotFound(url) => {
                info!("404 {url}");
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Not Found"));
                *response.status_mut() = axum::http::StatusCode::NOT_FOUND;
                response
            }
            CodebeastError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                let mut response =
                    axum::response::Response::new(axum::body::Body::from("Internal server error"));
                *response.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
                response
            }
        }
    }
}
