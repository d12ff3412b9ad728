//! API error handling utilities.

use crate::services::{FieldError, ImportError, ImportReport};
use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// Extra payload carried by some errors.
#[derive(Debug)]
pub enum ErrorDetails {
    None,
    /// Import validation problems, rendered as `{"errors": [...]}`.
    Errors(Vec<String>),
    /// Rejected request fields, rendered as `{"error": [{field, message}]}`.
    Fields(Vec<FieldError>),
    /// Entities persisted before an import failed.
    Created(ImportReport),
}

/// API error response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: ErrorDetails,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: ErrorDetails::None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn invalid_fields(fields: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Invalid request".to_string(),
            details: ErrorDetails::Fields(fields),
        }
    }

    /// `Ok(())` when no field was rejected.
    pub fn check_fields(fields: Vec<FieldError>) -> Result<(), ApiError> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(Self::invalid_fields(fields))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            ErrorDetails::None => json!({
                "error": self.message,
                "status": self.status.as_u16(),
            }),
            ErrorDetails::Errors(errors) => json!({ "errors": errors }),
            ErrorDetails::Fields(fields) => json!({ "error": fields }),
            ErrorDetails::Created(created) => json!({
                "error": self.message,
                "created": created,
            }),
        };

        (self.status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { .. } => ApiError::not_found(e.to_string()),
            StorageError::Conflict { .. } => ApiError::conflict(e.to_string()),
            StorageError::ConnectionError(_) | StorageError::Other(_) => {
                error!("Storage failure: {}", e);
                ApiError::internal()
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Malformed(message) => Self::invalid_fields(vec![FieldError::new(
                "yaml",
                format!("failed to parse import document: {message}"),
            )]),
            ImportError::Validation(errors) => Self {
                status: StatusCode::CONFLICT,
                message: "Import document is invalid".to_string(),
                details: ErrorDetails::Errors(errors),
            },
            ImportError::Materialization { message, created } => Self {
                status: StatusCode::CONFLICT,
                message,
                details: ErrorDetails::Created(created),
            },
            ImportError::Storage(e) => e.into(),
        }
    }
}
