//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::ProviderError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Request carried no usable email
    #[error("Email is required")]
    EmailRequired,

    /// Email failed shape validation
    #[error("{0}")]
    InvalidEmail(String),

    /// Sign-in or sign-up without a password
    #[error("Password is required")]
    PasswordRequired,

    /// Identity provider rejected the call (message is the provider's own)
    #[error("{message}")]
    Provider { status: u16, message: String },

    /// Identity provider could not be reached
    #[error("Identity provider unreachable: {0}")]
    Transport(String),

    /// Identity provider answered with an unreadable body
    #[error("Unexpected identity provider response: {0}")]
    Decode(String),

    /// Operation needs a signed-in session
    #[error("No active session")]
    SessionMissing,

    /// The controller already holds a change subscription
    #[error("Session change subscription already active")]
    SubscriptionActive,

    /// Provider refused to send the verification email
    #[error("{0}")]
    VerificationRejected(String),

    /// Anything unexpected on the resend path
    #[error("Failed to resend verification email")]
    ResendFailed,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::EmailRequired
            | AuthError::PasswordRequired
            | AuthError::InvalidEmail(_)
            | AuthError::VerificationRejected(_) => ErrorKind::BadRequest,
            AuthError::Provider { status, .. } => ErrorKind::from_upstream_status(*status),
            AuthError::Transport(_) => ErrorKind::ServiceUnavailable,
            AuthError::Decode(_) => ErrorKind::BadGateway,
            AuthError::SessionMissing => ErrorKind::Unauthorized,
            AuthError::SubscriptionActive => ErrorKind::Conflict,
            AuthError::ResendFailed | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Transport(e) | AuthError::Decode(e) => {
                tracing::error!(error = %e, "Identity provider failure");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Provider { status, message } => {
                tracing::warn!(status = *status, message = %message, "Identity provider rejected request");
            }
            AuthError::VerificationRejected(message) => {
                tracing::warn!(message = %message, "Verification email rejected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Transport(e) => AuthError::Transport(e),
            ProviderError::Rejected { status, message } => AuthError::Provider { status, message },
            ProviderError::Decode(e) => AuthError::Decode(e),
            ProviderError::InvalidSettings(e) => AuthError::Internal(e),
        }
    }
}
