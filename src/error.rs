//! Error types for the book catalog server

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    api::flash::FlashMessage,
    repository::StoreError,
    views,
};

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// One or more required fields are missing; the message lists all of them
    #[error("{0}")]
    Validation(String),

    /// Submitted ISBN already belongs to another book
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Store(#[from] StoreError),

    /// No store client could be constructed at startup
    #[error("Database connection is not available")]
    StoreUnavailable,

    #[error("Page not found")]
    PageNotFound,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            AppError::StoreUnavailable => {
                tracing::error!("Request rejected: no store client configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database connection failed",
                    self.to_string(),
                )
            }
            AppError::PageNotFound => (
                StatusCode::NOT_FOUND,
                "Page not found",
                "The requested page was not found".to_string(),
            ),
            // Operation failures are turned into status messages by the
            // handlers; reaching this point means one escaped.
            AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::NotFound(_)
            | AppError::Store(_)
            | AppError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let page = views::error_page(title, &[FlashMessage::error(message)]);
        (status, Html(page)).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
