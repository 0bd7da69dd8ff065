use std::path::PathBuf;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiResponse;

pub type Result<T> = std::result::Result<T, ChurnError>;

#[derive(Debug, Error)]
pub enum ChurnError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("model artifact not found: {path}")]
    MissingArtifact { path: PathBuf },

    #[error("failed to load model artifact {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("invalid feature name {name:?}: {reason}")]
    FeatureSchema { name: String, reason: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("scorer returned {value}, outside [0, 1]")]
    ProbabilityOutOfRange { value: f64 },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("endpoint not found")]
    NotFound,

    #[error("execution error: {0}")]
    Execution(String),
}

impl ChurnError {
    /// Stable label used in the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "client_error",
            StatusCode::TOO_MANY_REQUESTS => "rate_limited",
            StatusCode::UNAUTHORIZED => "unauthorized",
            StatusCode::NOT_FOUND => "not_found",
            _ => "server_error",
        }
    }
}

impl ResponseError for ChurnError {
    fn status_code(&self) -> StatusCode {
        match self {
            ChurnError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ChurnError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ChurnError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ChurnError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::error(&self.to_string()).with_kind(self.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_and_server_errors_map_to_distinct_statuses() {
        let client = ChurnError::InvalidInput("tenure missing".into());
        assert_eq!(client.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(client.kind(), "client_error");

        let server = ChurnError::ProbabilityOutOfRange { value: 1.5 };
        assert_eq!(server.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(server.kind(), "server_error");
        assert!(server.to_string().contains("1.5"));
    }

    #[test]
    fn guard_errors() {
        assert_eq!(ChurnError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ChurnError::Unauthorized("missing API key").status_code(),
            StatusCode::UNAUTHORIZED
        );
    }
}
