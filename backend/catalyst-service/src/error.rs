/// Error types for catalyst-service
///
/// Every fallible operation returns [`AppError`]; handlers rely on the
/// `ResponseError` impl to turn it into a JSON body with a matching status.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::services::trending::ScoringReport;

/// Result type for catalyst-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate add, or removal of an interaction that does not exist
    #[error("Invalid interaction: {0}")]
    InvalidInteraction(String),

    /// Parent outside the project, or a move that would create a cycle
    #[error("Invalid branch: {0}")]
    InvalidBranch(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(#[from] catalyst_cache::CacheError),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The scoring pass ran to completion but some writes failed
    #[error(
        "Scoring pass incomplete: {} of {} writes failed",
        .0.failures.len(),
        .0.attempted()
    )]
    ScoringIncomplete(Box<ScoringReport>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInteraction(_) => StatusCode::CONFLICT,
            AppError::InvalidBranch(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Config(_)
            | AppError::ScoringIncomplete(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        // Callers need to know which entities failed, not only that some did
        if let AppError::ScoringIncomplete(report) = self {
            body["report"] = serde_json::to_value(report.as_ref()).unwrap_or_default();
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
