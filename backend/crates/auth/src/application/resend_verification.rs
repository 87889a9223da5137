//! Resend Verification Use Case
//!
//! Asks the identity provider to send the sign-up confirmation email again.

use std::sync::Arc;

use crate::application::parse_email;
use crate::domain::gateway::AuthGateway;
use crate::error::{AuthError, AuthResult};

/// Resend verification use case
pub struct ResendVerificationUseCase<G>
where
    G: AuthGateway,
{
    gateway: Arc<G>,
}

impl<G> ResendVerificationUseCase<G>
where
    G: AuthGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// `None`, blank and malformed addresses are rejected before the
    /// provider is called. Provider refusals keep the provider's message;
    /// anything else becomes [`AuthError::ResendFailed`].
    pub async fn execute(&self, email: Option<&str>) -> AuthResult<()> {
        let email = parse_email(email.unwrap_or_default())?;

        match self.gateway.resend_verification_email(&email).await {
            Ok(()) => {
                tracing::info!(domain = email.domain(), "Verification email resent");
                Ok(())
            }
            Err(e @ (AuthError::Provider { .. } | AuthError::Transport(_))) => {
                Err(AuthError::VerificationRejected(e.to_string()))
            }
            Err(e) => {
                tracing::error!(error = %e, "Error resending verification email");
                Err(AuthError::ResendFailed)
            }
        }
    }
}
