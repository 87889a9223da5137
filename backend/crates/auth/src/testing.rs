//! Scripted gateway for controller and route tests.
//!
//! Each provider call can be held open on a [`Gate`] so interleavings are
//! reproduced deterministically instead of with sleeps.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use kernel::id::UserId;
use tokio::sync::{Semaphore, broadcast, watch};

use crate::domain::entity::{session::Session, user::User};
use crate::domain::gateway::{
    AuthGateway, Credentials, SessionEvent, SessionSubscription, SignUpOutcome,
};
use crate::domain::navigator::Navigator;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub const PASSWORD: &str = "correct horse";

/// Upper bound for anything a test waits on
pub const WAIT: Duration = Duration::from_secs(5);

/// Holds callers until released.
pub struct Gate {
    held: AtomicBool,
    permits: Semaphore,
    entered: watch::Sender<usize>,
}

impl Gate {
    fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
            permits: Semaphore::new(0),
            entered: watch::channel(0).0,
        }
    }

    /// Make subsequent callers wait for [`release`](Self::release).
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` waiting (or future) callers through.
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Wait until at least `n` callers have reached the gate.
    pub async fn entered(&self, n: usize) {
        let mut rx = self.entered.subscribe();
        tokio::time::timeout(WAIT, rx.wait_for(|count| *count >= n))
            .await
            .expect("gate never reached")
            .expect("gate dropped");
    }

    async fn pass(&self) {
        self.entered.send_modify(|count| *count += 1);
        if self.held.load(Ordering::SeqCst) {
            self.permits
                .acquire()
                .await
                .expect("gate closed")
                .forget();
        }
    }
}

#[derive(Clone)]
pub enum ResendBehavior {
    Send,
    Reject(String),
    Unreachable,
    Garbled,
}

pub struct FakeGateway {
    session: Mutex<Option<Session>>,
    user: Mutex<Option<User>>,
    session_error: AtomicBool,
    sign_out_error: AtomicBool,
    resend: Mutex<ResendBehavior>,
    pub session_gate: Gate,
    pub user_gate: Gate,
    events: broadcast::Sender<SessionEvent>,
    pub subscribe_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub resent_to: Mutex<Vec<String>>,
}

impl FakeGateway {
    /// Nobody signed in
    pub fn signed_out() -> Self {
        Self {
            session: Mutex::new(None),
            user: Mutex::new(None),
            session_error: AtomicBool::new(false),
            sign_out_error: AtomicBool::new(false),
            resend: Mutex::new(ResendBehavior::Send),
            session_gate: Gate::new(),
            user_gate: Gate::new(),
            events: broadcast::channel(16).0,
            subscribe_calls: AtomicUsize::new(0),
            user_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
            resent_to: Mutex::new(Vec::new()),
        }
    }

    /// A valid session for a verified user
    pub fn signed_in() -> Self {
        let gateway = Self::signed_out();
        let (user, session) = account("agent@example.com");
        gateway.set_account(Some(user), Some(session));
        gateway
    }

    pub fn set_account(&self, user: Option<User>, session: Option<Session>) {
        *self.user.lock().unwrap() = user;
        *self.session.lock().unwrap() = session;
    }

    pub fn session(&self) -> Option<Session> {
        self.session.lock().unwrap().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.user.lock().unwrap().clone()
    }

    pub fn fail_get_session(&self) {
        self.session_error.store(true, Ordering::SeqCst);
    }

    pub fn fail_sign_out(&self) {
        self.sign_out_error.store(true, Ordering::SeqCst);
    }

    pub fn set_resend(&self, behavior: ResendBehavior) {
        *self.resend.lock().unwrap() = behavior;
    }

    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribers(&self) -> usize {
        self.events.receiver_count()
    }
}

impl AuthGateway for FakeGateway {
    async fn sign_in(&self, credentials: &Credentials) -> AuthResult<Session> {
        if credentials.password() != PASSWORD {
            return Err(AuthError::Provider {
                status: 400,
                message: "Invalid login credentials".to_string(),
            });
        }
        let (user, session) = account(credentials.email.as_str());
        self.set_account(Some(user), Some(session.clone()));
        self.emit(SessionEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, credentials: &Credentials) -> AuthResult<SignUpOutcome> {
        let (mut user, _) = account(credentials.email.as_str());
        user.email_confirmed_at = None;
        Ok(SignUpOutcome {
            user,
            session: None,
        })
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if self.sign_out_error.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("connection reset".to_string()));
        }
        self.set_account(None, None);
        self.emit(SessionEvent::signed_out());
        Ok(())
    }

    async fn get_session(&self) -> AuthResult<Option<Session>> {
        self.session_gate.pass().await;
        if self.session_error.load(Ordering::SeqCst) {
            return Err(AuthError::Transport("connection refused".to_string()));
        }
        Ok(self.session())
    }

    /// The answer is taken when the call starts, like a response already
    /// on the wire when state changes.
    async fn get_user(&self) -> AuthResult<Option<User>> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        let user = self.user();
        self.user_gate.pass().await;
        Ok(user)
    }

    async fn resend_verification_email(&self, email: &Email) -> AuthResult<()> {
        self.resent_to.lock().unwrap().push(email.to_string());
        let behavior = self.resend.lock().unwrap().clone();
        match behavior {
            ResendBehavior::Send => Ok(()),
            ResendBehavior::Reject(message) => Err(AuthError::Provider {
                status: 429,
                message,
            }),
            ResendBehavior::Unreachable => Err(AuthError::Transport("timed out".to_string())),
            ResendBehavior::Garbled => Err(AuthError::Decode("expected value".to_string())),
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        SessionSubscription::new(self.events.subscribe())
    }
}

/// Verified user plus a one-hour session for `email`.
pub fn account(email: &str) -> (User, Session) {
    let id = UserId::new();
    let user = User {
        id,
        email: Some(Email::from_provider(email)),
        email_confirmed_at: Some(Utc::now()),
        created_at: Utc::now(),
        last_sign_in_at: Some(Utc::now()),
        provider: Some("email".to_string()),
    };
    let session = Session {
        access_token: format!("access-{}", id.short()),
        refresh_token: Some(format!("refresh-{}", id.short())),
        token_type: "bearer".to_string(),
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
        user_id: id,
    };
    (user, session)
}

/// Navigator that only records.
#[derive(Default)]
pub struct RecordingNavigator {
    pub visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visited.lock().unwrap().push(path.to_string());
    }
}
