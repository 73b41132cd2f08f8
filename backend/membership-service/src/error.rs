/// Error types for membership-service
///
/// Every variant maps onto the shared `error_types::ServiceError` envelope so
/// HTTP clients see the same JSON shape as from the other services.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use error_types::{error_codes, ServiceError};
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized")]
    Unauthorized,

    /// Parent stream could not be located
    #[error("operation failed: stream {0} not found")]
    StreamNotFound(Uuid),

    /// Parent chat space could not be located
    #[error("operation failed: chat space {0} not found")]
    ChatSpaceNotFound(Uuid),

    #[error("attendee not found for stream {stream_id} and member {member_id}")]
    AttendeeNotFound { stream_id: Uuid, member_id: Uuid },

    #[error("member {member_id} not found in chat space {chat_space_id}")]
    MemberNotFound { chat_space_id: Uuid, member_id: Uuid },

    #[error("member was removed from the chat space")]
    MemberRemoved,

    #[error("only the stream organizer can do this")]
    NotOrganizer,

    #[error("only an active chat space admin can do this")]
    NotAdmin,

    #[error("chat space must keep at least one admin")]
    LastAdmin,

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn to_service_error(&self) -> ServiceError {
        let msg = self.to_string();
        match self {
            AppError::BadRequest(_) => ServiceError::BadRequest(msg),
            AppError::Validation(_) => ServiceError::ValidationError(msg),
            AppError::Unauthorized => ServiceError::Unauthorized,
            AppError::StreamNotFound(_)
            | AppError::ChatSpaceNotFound(_)
            | AppError::AttendeeNotFound { .. }
            | AppError::MemberNotFound { .. } => ServiceError::NotFound(msg),
            AppError::MemberRemoved | AppError::NotOrganizer | AppError::NotAdmin => {
                ServiceError::Forbidden(msg)
            }
            AppError::LastAdmin => ServiceError::Conflict(msg),
            AppError::Database(_) => ServiceError::Database(msg),
            AppError::Internal(_) => ServiceError::InternalError(msg),
        }
    }

    /// Stable code for clients, more specific than the envelope default
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::StreamNotFound(_) => error_codes::STREAM_NOT_FOUND,
            AppError::ChatSpaceNotFound(_) => error_codes::CHAT_SPACE_NOT_FOUND,
            AppError::AttendeeNotFound { .. } => error_codes::ATTENDEE_NOT_FOUND,
            AppError::MemberNotFound { .. } => error_codes::MEMBER_NOT_FOUND,
            AppError::MemberRemoved => error_codes::MEMBER_REMOVED,
            AppError::NotAdmin => error_codes::NOT_CHAT_SPACE_ADMIN,
            AppError::LastAdmin => error_codes::LAST_ADMIN,
            other => other.to_service_error().error_code(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.to_service_error().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let service_error = self.to_service_error();
        if service_error.status_code() >= 500 {
            tracing::error!(error = %self, "request failed");
        }
        let body = service_error.to_response().with_code(self.error_code());
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}
