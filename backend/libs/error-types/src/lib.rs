use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service-level error shared by the membership services
///
/// Converted into the common [`ErrorResponse`] envelope at the HTTP edge.
///
/// ```ignore
/// let stream = repo.find_stream(id).await?
///     .ok_or_else(|| ServiceError::NotFound(format!("stream {}", id)))?;
/// ```
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Unauthorized => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::ValidationError(_) => 400,
            ServiceError::BadRequest(_) => 400,
            ServiceError::Conflict(_) => 409,
            ServiceError::Database(_) | ServiceError::InternalError(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_codes::OPERATION_FAILED,
            ServiceError::Unauthorized => error_codes::TOKEN_MISSING,
            ServiceError::Forbidden(_) => "FORBIDDEN",
            ServiceError::ValidationError(_) => "VALIDATION_ERROR",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Database(_) => error_codes::DATABASE_ERROR,
            ServiceError::InternalError(_) => error_codes::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_types::NOT_FOUND_ERROR,
            ServiceError::Unauthorized => error_types::AUTHENTICATION_ERROR,
            ServiceError::Forbidden(_) => error_types::AUTHORIZATION_ERROR,
            ServiceError::ValidationError(_) | ServiceError::BadRequest(_) => {
                error_types::VALIDATION_ERROR
            }
            ServiceError::Conflict(_) => error_types::CONFLICT_ERROR,
            ServiceError::Database(_) | ServiceError::InternalError(_) => {
                error_types::SERVER_ERROR
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(
            self.error_type(),
            &self.to_string(),
            self.status_code(),
            self.error_type(),
            self.error_code(),
        )
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("row not found".to_string()),
            other => ServiceError::Database(other.to_string()),
        }
    }
}

/// Common API error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Human readable message
    pub message: String,

    /// HTTP status code
    pub status: u16,

    /// Category used by clients for routing, see [`error_types`]
    pub error_type: String,

    /// Stable code used by clients for localization, see [`error_codes`]
    pub code: String,

    /// RFC 3339
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }
}

/// Stable error codes
pub mod error_codes {
    // Authentication
    pub const TOKEN_MISSING: &str = "TOKEN_MISSING";

    // Streams
    pub const STREAM_NOT_FOUND: &str = "STREAM_NOT_FOUND";
    pub const ATTENDEE_NOT_FOUND: &str = "ATTENDEE_NOT_FOUND";

    // Chat spaces
    pub const CHAT_SPACE_NOT_FOUND: &str = "CHAT_SPACE_NOT_FOUND";
    pub const MEMBER_NOT_FOUND: &str = "MEMBER_NOT_FOUND";
    pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";
    pub const NOT_CHAT_SPACE_ADMIN: &str = "NOT_CHAT_SPACE_ADMIN";
    pub const LAST_ADMIN: &str = "LAST_ADMIN";

    // Generic
    pub const OPERATION_FAILED: &str = "OPERATION_FAILED";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";
}

/// Error categories
pub mod error_types {
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const AUTHENTICATION_ERROR: &str = "authentication_error";
    pub const AUTHORIZATION_ERROR: &str = "authorization_error";
    pub const NOT_FOUND_ERROR: &str = "not_found_error";
    pub const CONFLICT_ERROR: &str = "conflict_error";
    pub const SERVER_ERROR: &str = "server_error";
}
