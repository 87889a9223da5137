//! Ticket Error Types
//!
//! Ticket-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::ProviderError;
use thiserror::Error;

use crate::domain::value_objects::TicketId;

/// Ticket-specific result type alias
pub type TicketResult<T> = Result<T, TicketError>;

#[derive(Debug, Error)]
pub enum TicketError {
    /// No ticket with this id is visible to the caller
    #[error("Ticket {0} not found")]
    NotFound(TicketId),

    /// Update carried no fields
    #[error("Nothing to update")]
    EmptyUpdate,

    /// Data service rejected the call (message is the service's own)
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Data service could not be reached
    #[error("Data service unreachable: {0}")]
    Transport(String),

    /// Data service answered with an unreadable body
    #[error("Unexpected data service response: {0}")]
    Decode(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TicketError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TicketError::NotFound(_) => ErrorKind::NotFound,
            TicketError::EmptyUpdate => ErrorKind::BadRequest,
            TicketError::Provider { status, .. } => ErrorKind::from_upstream_status(*status),
            TicketError::Transport(_) => ErrorKind::ServiceUnavailable,
            TicketError::Decode(_) => ErrorKind::BadGateway,
            TicketError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            TicketError::Transport(e) | TicketError::Decode(e) => {
                tracing::error!(error = %e, "Data service failure");
            }
            TicketError::Internal(msg) => {
                tracing::error!(message = %msg, "Tickets internal error");
            }
            TicketError::Provider { status, message } => {
                tracing::warn!(status = *status, message = %message, "Data service rejected request");
            }
            _ => {
                tracing::debug!(error = %self, "Ticket error");
            }
        }
    }
}

impl IntoResponse for TicketError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<ProviderError> for TicketError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport(e) => TicketError::Transport(e),
            ProviderError::Rejected { status, message } => TicketError::Provider { status, message },
            ProviderError::Decode(e) => TicketError::Decode(e),
            ProviderError::InvalidSettings(e) => TicketError::Internal(e),
        }
    }
}
