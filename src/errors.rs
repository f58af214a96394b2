use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::io::ErrorKind;
use thiserror::Error;

use crate::{files::ReadError, resolver::ResolveError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("path traversal detected")]
    TraversalDetected,
    #[error("file not found")]
    NotFound,
    #[error("cannot read a directory")]
    IsDirectory,
    #[error("unauthenticated: set X-User-Id")]
    Unauthenticated,
    #[error("forbidden: access denied")]
    Forbidden,
    #[error("internal error: {0}")]
    Internal(String),
    /// I/O failure the request itself provoked, such as an over-long name.
    #[error("internal error: {0}")]
    ClientIo(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation-error",
            AppError::TraversalDetected => "traversal-detected",
            AppError::NotFound => "not-found",
            AppError::IsDirectory => "is-directory",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Forbidden => "forbidden",
            AppError::Internal(_) | AppError::ClientIo(_) => "internal-error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::IsDirectory => StatusCode::BAD_REQUEST,
            AppError::TraversalDetected | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) | AppError::ClientIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to put on the wire. Internal detail never leaves the process.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) | AppError::ClientIo(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) => tracing::error!(detail = %detail, "internal error"),
            AppError::ClientIo(detail) => tracing::warn!(detail = %detail, "request caused i/o failure"),
            _ => {}
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(reason) => AppError::Validation(reason.to_string()),
            ResolveError::TraversalDetected => AppError::TraversalDetected,
        }
    }
}

impl From<ReadError> for AppError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::NotFound => AppError::NotFound,
            ReadError::IsDirectory => AppError::IsDirectory,
            ReadError::Io(e) if e.kind() == ErrorKind::InvalidFilename => {
                AppError::ClientIo(e.to_string())
            }
            ReadError::Io(e) => AppError::Internal(e.to_string()),
        }
    }
}
