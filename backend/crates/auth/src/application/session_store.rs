//! Session Store
//!
//! Holds the current [`AuthState`]. Readers get snapshots or a watch
//! receiver; only the session controller writes, and only through a
//! generation ticket.
//!
//! Every resolution takes a ticket from [`SessionStore::begin`] before it
//! starts. A commit is applied only if its ticket is still the newest one,
//! so the most recently started resolution is authoritative regardless of
//! which network call returns first.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::domain::entity::auth_state::AuthState;

/// Ticket identifying one resolution attempt
pub type Generation = u64;

#[derive(Debug)]
pub struct SessionStore {
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// New store in [`AuthState::Loading`]
    pub fn new() -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Start a resolution; supersedes every ticket handed out before.
    pub(crate) fn begin(&self) -> Generation {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn generation(&self) -> Generation {
        self.generation.load(Ordering::SeqCst)
    }

    /// Replace the state if `ticket` is still current. Returns whether the
    /// commit was accepted.
    pub(crate) fn commit(&self, ticket: Generation, next: AuthState) -> bool {
        self.commit_with(ticket, |_| Some(next))
    }

    /// Like [`commit`](Self::commit) but derives the next state from the
    /// current one; `None` leaves it untouched.
    ///
    /// The ticket check and the write happen under the channel's write
    /// lock, so User and Session are always replaced together.
    pub(crate) fn commit_with<F>(&self, ticket: Generation, update: F) -> bool
    where
        F: FnOnce(&AuthState) -> Option<AuthState>,
    {
        let mut accepted = false;

        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            let Some(next) = update(state) else {
                return false;
            };
            accepted = true;
            if *state == next {
                return false;
            }
            *state = next;
            true
        });

        accepted
    }
}
