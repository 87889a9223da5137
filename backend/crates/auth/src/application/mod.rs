//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod resend_verification;
pub mod route_guard;
pub mod session_controller;
pub mod session_store;
pub mod sign_in;
pub mod sign_up;

// Re-exports
pub use config::AuthConfig;
pub use resend_verification::ResendVerificationUseCase;
pub use route_guard::{GuardDecision, PathClass};
pub use session_controller::SessionController;
pub use session_store::SessionStore;
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_up::{SignUpInput, SignUpOutput, SignUpUseCase};

use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// Validate a user-supplied email, distinguishing "missing" from "malformed".
pub(crate) fn parse_email(raw: &str) -> AuthResult<Email> {
    if raw.trim().is_empty() {
        return Err(AuthError::EmailRequired);
    }
    Email::new(raw).map_err(|e| AuthError::InvalidEmail(e.message().to_string()))
}
