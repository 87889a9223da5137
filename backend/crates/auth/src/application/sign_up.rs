//! Sign Up Use Case
//!
//! Registers a new account with the identity provider.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::parse_email;
use crate::domain::entity::user::User;
use crate::domain::gateway::{AuthGateway, Credentials};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub password: String,
}

/// Sign up output
pub struct SignUpOutput {
    pub user: User,
    /// The provider sent a confirmation email; no session yet
    pub needs_confirmation: bool,
    /// Where the sign-up page should navigate next
    pub redirect_to: String,
}

/// Sign up use case
pub struct SignUpUseCase<G>
where
    G: AuthGateway,
{
    gateway: Arc<G>,
    config: Arc<AuthConfig>,
}

impl<G> SignUpUseCase<G>
where
    G: AuthGateway,
{
    pub fn new(gateway: Arc<G>, config: Arc<AuthConfig>) -> Self {
        Self { gateway, config }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = parse_email(&input.email)?;
        if input.password.is_empty() {
            return Err(AuthError::PasswordRequired);
        }

        let outcome = self
            .gateway
            .sign_up(&Credentials::new(email, input.password))
            .await?;

        let needs_confirmation = outcome.needs_confirmation();
        tracing::info!(
            user_id = %outcome.user.id,
            needs_confirmation,
            "User signed up"
        );

        Ok(SignUpOutput {
            user: outcome.user,
            needs_confirmation,
            redirect_to: self.config.post_sign_up_path().to_string(),
        })
    }
}
