//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::ResendVerificationUseCase;
use crate::domain::gateway::AuthGateway;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{MessageResponse, ResendVerificationRequest};

/// Shared state for auth handlers
pub struct AuthAppState<G>
where
    G: AuthGateway + Send + Sync + 'static,
{
    pub gateway: Arc<G>,
    pub config: Arc<AuthConfig>,
}

impl<G> Clone for AuthAppState<G>
where
    G: AuthGateway + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Resend Verification
// ============================================================================

/// POST /api/auth/resend-verification
///
/// The body is parsed by hand: unreadable JSON is an unexpected failure
/// (500), while a well-formed body with a wrongly typed `email` is a bad
/// request (400).
pub async fn resend_verification<G>(
    State(state): State<AuthAppState<G>>,
    body: Bytes,
) -> AuthResult<Json<MessageResponse>>
where
    G: AuthGateway + Send + Sync + 'static,
{
    let req: ResendVerificationRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) if e.is_data() => {
            return Err(AuthError::InvalidEmail("Invalid email format".to_string()));
        }
        Err(e) => {
            tracing::error!(error = %e, "Unreadable resend-verification body");
            return Err(AuthError::ResendFailed);
        }
    };

    let use_case = ResendVerificationUseCase::new(state.gateway.clone());
    use_case.execute(req.email.as_deref()).await?;

    Ok(Json(MessageResponse::new(
        "Verification email sent successfully",
    )))
}
