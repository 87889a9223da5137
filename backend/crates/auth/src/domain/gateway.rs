//! Auth Gateway
//!
//! Facade over the external identity provider. Implementation is in the
//! infrastructure layer.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

/// Email + password pair for sign-in and sign-up
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    password: String,
}

impl Credentials {
    pub fn new(email: Email, password: impl Into<String>) -> Self {
        Self {
            email,
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Result of a sign-up
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: User,
    /// Present only when the provider auto-confirms new accounts
    pub session: Option<Session>,
}

impl SignUpOutcome {
    /// The user must follow the confirmation email before signing in.
    pub fn needs_confirmation(&self) -> bool {
        self.session.is_none()
    }
}

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// Provider-pushed session change
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub kind: SessionEventKind,
    /// Session after the change; `None` means nobody is signed in
    pub session: Option<Session>,
}

impl SessionEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: SessionEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: SessionEventKind::SignedOut,
            session: None,
        }
    }

    pub fn token_refreshed(session: Session) -> Self {
        Self {
            kind: SessionEventKind::TokenRefreshed,
            session: Some(session),
        }
    }

    pub fn user_updated(session: Session) -> Self {
        Self {
            kind: SessionEventKind::UserUpdated,
            session: Some(session),
        }
    }
}

/// Cancellable stream of [`SessionEvent`]s.
///
/// Dropping the subscription (or calling [`unsubscribe`](Self::unsubscribe))
/// releases it.
#[derive(Debug)]
pub struct SessionSubscription {
    receiver: Option<broadcast::Receiver<SessionEvent>>,
}

impl SessionSubscription {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// Next event, or `None` once unsubscribed or the gateway is gone.
    ///
    /// A lagging subscriber skips straight to the oldest retained event;
    /// the newest event is never lost.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Session subscription lagged");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn unsubscribe(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

/// Identity provider facade.
///
/// Every call returns either a payload or an [`AuthError`](crate::error::AuthError)
/// whose message is fit for display.
#[trait_variant::make(AuthGateway: Send)]
pub trait LocalAuthGateway {
    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<Session>;

    async fn sign_up(&self, credentials: &Credentials) -> AuthResult<SignUpOutcome>;

    /// End the current session remotely and locally
    async fn sign_out(&self) -> AuthResult<()>;

    /// Current session, refreshed first if it is about to expire
    async fn get_session(&self) -> AuthResult<Option<Session>>;

    /// Full profile of the session's user
    async fn get_user(&self) -> AuthResult<Option<User>>;

    async fn resend_verification_email(&self, email: &Email) -> AuthResult<()>;

    /// Register for session change notifications
    fn subscribe(&self) -> SessionSubscription;
}
