//! Sign In Use Case
//!
//! Authenticates with email + password through the identity provider.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::parse_email;
use crate::domain::entity::session::Session;
use crate::domain::gateway::{AuthGateway, Credentials};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in output
pub struct SignInOutput {
    pub session: Session,
    /// Where the sign-in page should navigate next
    pub redirect_to: String,
}

/// Sign in use case
pub struct SignInUseCase<G>
where
    G: AuthGateway,
{
    gateway: Arc<G>,
    config: Arc<AuthConfig>,
}

impl<G> SignInUseCase<G>
where
    G: AuthGateway,
{
    pub fn new(gateway: Arc<G>, config: Arc<AuthConfig>) -> Self {
        Self { gateway, config }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<SignInOutput> {
        let email = parse_email(&input.email)?;
        if input.password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let credentials = Credentials::new(email, input.password);
        let session = match self.gateway.sign_in(&credentials).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(domain = credentials.email.domain(), error = %e, "Sign-in failed");
                return Err(e);
            }
        };

        tracing::info!(user_id = %session.user_id, "User signed in");

        Ok(SignInOutput {
            session,
            redirect_to: self.config.post_sign_in_path.clone(),
        })
    }
}
