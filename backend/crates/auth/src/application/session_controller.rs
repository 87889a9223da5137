//! Session Lifecycle Controller
//!
//! Owns the [`SessionStore`]. Resolves the initial session, follows the
//! gateway's change stream, and exposes sign-out and profile refresh.
//!
//! Resolution order is decided by generation tickets (see
//! [`session_store`](crate::application::session_store)): the most recently
//! started resolution wins. A pushed change event therefore supersedes a
//! slower `initialize()`, and `sign_out()` supersedes everything in flight.
//!
//! While `Authenticated`, a timer re-resolves the session when it expires;
//! if the gateway has no fresh session by then the state drops to
//! `Unauthenticated`.

use std::sync::{Arc, Mutex, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::config::AuthConfig;
use crate::application::session_store::{Generation, SessionStore};
use crate::domain::entity::{auth_state::AuthState, session::Session};
use crate::domain::gateway::AuthGateway;
use crate::domain::navigator::Navigator;
use crate::error::{AuthError, AuthResult};

/// Session lifecycle controller
///
/// Cheap to clone; clones share the same store and subscription.
pub struct SessionController<G, N> {
    inner: Arc<Inner<G, N>>,
}

struct Inner<G, N> {
    gateway: Arc<G>,
    navigator: Arc<N>,
    config: Arc<AuthConfig>,
    store: SessionStore,
    tasks: Mutex<Option<ControllerTasks>>,
    /// Re-resolution scheduled for the committed session's expiry
    expiry: Mutex<Option<JoinHandle<()>>>,
}

/// Background work started by [`SessionController::start`]
struct ControllerTasks {
    listener: JoinHandle<()>,
    initial: JoinHandle<()>,
}

impl ControllerTasks {
    fn abort(self) {
        self.listener.abort();
        self.initial.abort();
    }
}

impl<G, N> Clone for SessionController<G, N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<G, N> Inner<G, N> {
    fn replace_expiry(&self, next: Option<JoinHandle<()>>) {
        let previous = match self.expiry.lock() {
            Ok(mut slot) => std::mem::replace(&mut *slot, next),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), next),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Called from the timer task itself: forget its handle so the commit
    /// that follows cannot abort the task running it.
    fn detach_current_expiry(&self) {
        let mut slot = match self.expiry.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot
            .as_ref()
            .is_some_and(|timer| timer.id() == tokio::task::id())
        {
            slot.take();
        }
    }
}

impl<G, N> Drop for Inner<G, N> {
    fn drop(&mut self) {
        if let Some(tasks) = self.tasks.get_mut().ok().and_then(Option::take) {
            tasks.abort();
        }
        if let Some(expiry) = self.expiry.get_mut().ok().and_then(Option::take) {
            expiry.abort();
        }
    }
}

impl<G, N> SessionController<G, N>
where
    G: AuthGateway + Send + Sync + 'static,
    N: Navigator + 'static,
{
    pub fn new(gateway: Arc<G>, navigator: Arc<N>, config: Arc<AuthConfig>) -> Self {
        Self {
            inner: Arc::new(Inner {
                gateway,
                navigator,
                config,
                store: SessionStore::new(),
                tasks: Mutex::new(None),
                expiry: Mutex::new(None),
            }),
        }
    }

    /// Subscribe to session changes and kick off the initial resolution.
    ///
    /// Exactly one subscription per controller; a second call fails with
    /// [`AuthError::SubscriptionActive`] until [`shutdown`](Self::shutdown).
    pub fn start(&self) -> AuthResult<()> {
        let mut tasks = self
            .inner
            .tasks
            .lock()
            .map_err(|_| AuthError::Internal("controller task lock poisoned".into()))?;

        if tasks.is_some() {
            return Err(AuthError::SubscriptionActive);
        }

        let mut subscription = self.inner.gateway.subscribe();

        // The listener must not keep the controller alive, or dropping the
        // last handle would never cancel the subscription.
        let weak: Weak<Inner<G, N>> = Arc::downgrade(&self.inner);
        let listener = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                tracing::debug!(kind = ?event.kind, "Session change event");
                SessionController { inner }
                    .on_session_changed(event.session)
                    .await;
            }
            tracing::debug!("Session change listener stopped");
        });

        let controller = self.clone();
        let initial = tokio::spawn(async move {
            controller.initialize().await;
        });

        *tasks = Some(ControllerTasks { listener, initial });
        tracing::debug!("Session controller started");
        Ok(())
    }

    /// Cancel the subscription, the expiry timer and any initial
    /// resolution still running.
    pub fn shutdown(&self) {
        let tasks = match self.inner.tasks.lock() {
            Ok(mut tasks) => tasks.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        self.inner.replace_expiry(None);
        if let Some(tasks) = tasks {
            tasks.abort();
            tracing::debug!("Session controller stopped");
        }
    }

    pub fn is_started(&self) -> bool {
        self.inner
            .tasks
            .lock()
            .map(|tasks| tasks.is_some())
            .unwrap_or(false)
    }

    /// Resolve the current session once.
    ///
    /// Always leaves `Loading` behind unless a newer resolution took over;
    /// provider failures fall back to `Unauthenticated`.
    pub async fn initialize(&self) -> AuthState {
        self.reload("initialize").await;
        self.state()
    }

    /// Handle a provider-reported session change.
    ///
    /// Safe to call concurrently with itself, [`initialize`](Self::initialize)
    /// and [`sign_out`](Self::sign_out).
    pub async fn on_session_changed(&self, session: Option<Session>) {
        let ticket = self.inner.store.begin();

        let next = match session {
            Some(session) => self.resolve(session).await,
            None => AuthState::Unauthenticated,
        };

        self.apply(ticket, next, "session change");
    }

    /// Sign out remotely, then clear local state whatever the outcome, and
    /// navigate to the sign-in entry point. The remote error, if any, is
    /// returned for the caller to surface.
    pub async fn sign_out(&self) -> AuthResult<()> {
        // Invalidate resolutions already in flight before the remote call
        self.inner.store.begin();

        let result = self.inner.gateway.sign_out().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Remote sign-out failed; clearing local session anyway");
        }

        // Fresh ticket: anything that started during the remote call loses too
        let ticket = self.inner.store.begin();
        self.inner.store.commit(ticket, AuthState::Unauthenticated);
        self.inner.replace_expiry(None);
        tracing::info!("User signed out");

        self.inner.navigator.navigate(&self.inner.config.sign_in_path);
        result
    }

    /// Re-fetch the user profile, keeping the session.
    ///
    /// No-op unless currently `Authenticated`. The refreshed profile is
    /// dropped if any resolution started meanwhile.
    pub async fn refresh_user(&self) -> AuthResult<()> {
        let ticket = self.inner.store.generation();
        if !self.state().is_authenticated() {
            return Ok(());
        }

        let Some(user) = self.inner.gateway.get_user().await? else {
            return Ok(());
        };

        let applied = self.inner.store.commit_with(ticket, |state| match state {
            AuthState::Authenticated { user: current, session } if current.id == user.id => {
                Some(AuthState::authenticated(user, session.clone()))
            }
            _ => None,
        });

        if applied {
            self.schedule_expiry();
        }
        tracing::debug!(applied, "User profile refreshed");
        Ok(())
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.inner.store.current()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.inner.store.watch()
    }

    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    /// Turn a session into a state: expired or unresolvable sessions are
    /// treated as signed out.
    async fn resolve(&self, session: Session) -> AuthState {
        if session.is_expired() {
            tracing::debug!(user_id = %session.user_id, "Session expired");
            return AuthState::Unauthenticated;
        }

        match self.inner.gateway.get_user().await {
            Ok(Some(user)) if user.id == session.user_id => AuthState::authenticated(user, session),
            Ok(Some(user)) => {
                tracing::warn!(
                    session_user = %session.user_id,
                    resolved_user = %user.id,
                    "Session and user profile disagree"
                );
                AuthState::Unauthenticated
            }
            Ok(None) => {
                tracing::warn!(user_id = %session.user_id, "Session has no resolvable user");
                AuthState::Unauthenticated
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %session.user_id, "Failed to fetch user profile");
                AuthState::Unauthenticated
            }
        }
    }

    /// Ask the gateway for the current session and resolve it.
    async fn reload(&self, source: &'static str) {
        let ticket = self.inner.store.begin();

        let next = match self.inner.gateway.get_session().await {
            Ok(Some(session)) => self.resolve(session).await,
            Ok(None) => AuthState::Unauthenticated,
            Err(e) => {
                tracing::error!(error = %e, source, "Failed to fetch current session");
                AuthState::Unauthenticated
            }
        };

        self.apply(ticket, next, source);
    }

    fn apply(&self, ticket: Generation, next: AuthState, source: &'static str) {
        let state = next.label();
        if self.inner.store.commit(ticket, next) {
            tracing::debug!(source, state, "Auth state resolved");
            self.schedule_expiry();
        } else {
            tracing::debug!(source, ticket, "Superseded resolution discarded");
        }
    }

    /// Replace the expiry timer to match the committed state.
    fn schedule_expiry(&self) {
        let remaining = match self.state() {
            AuthState::Authenticated { session, .. } => session.remaining(),
            _ => None,
        };
        let Some(remaining) = remaining else {
            self.inner.replace_expiry(None);
            return;
        };

        let weak = Arc::downgrade(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.detach_current_expiry();
            tracing::debug!("Session reached expiry; re-resolving");
            SessionController { inner }.reload("expiry").await;
        });
        self.inner.replace_expiry(Some(timer));
    }
}
