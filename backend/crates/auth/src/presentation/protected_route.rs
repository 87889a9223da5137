//! Protected Route
//!
//! Drives the route guard: re-evaluates on every change of auth state or
//! location, performs redirects through the [`Navigator`], and tells the
//! rendering layer whether to show the loading placeholder.

use std::sync::Arc;

use tokio::sync::watch;

use crate::application::config::AuthConfig;
use crate::application::route_guard::{self, GuardDecision};
use crate::domain::entity::auth_state::AuthState;
use crate::domain::navigator::Navigator;

/// What the rendering layer should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteView {
    /// Session still resolving
    Loading,
    /// Render the page (a pending redirect replaces it shortly)
    Content,
}

pub struct ProtectedRoute<N> {
    auth: watch::Receiver<AuthState>,
    location: watch::Receiver<String>,
    navigator: Arc<N>,
    config: Arc<AuthConfig>,
}

impl<N> ProtectedRoute<N>
where
    N: Navigator,
{
    pub fn new(
        auth: watch::Receiver<AuthState>,
        location: watch::Receiver<String>,
        navigator: Arc<N>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            auth,
            location,
            navigator,
            config,
        }
    }

    /// Guard decision for the current state and location
    pub fn decision(&self) -> GuardDecision {
        route_guard::evaluate(&self.auth.borrow(), &self.location.borrow(), &self.config)
    }

    pub fn view(&self) -> RouteView {
        match self.decision() {
            GuardDecision::Pending => RouteView::Loading,
            GuardDecision::Allow | GuardDecision::Redirect(_) => RouteView::Content,
        }
    }

    /// Evaluate once and perform the redirect, if any.
    pub fn check(&self) -> GuardDecision {
        // Owned decision: no channel borrow may be held while navigating
        let decision = self.decision();

        if let GuardDecision::Redirect(target) = &decision {
            tracing::info!(
                from = %self.location.borrow().as_str(),
                to = %target,
                "Route guard redirect"
            );
            self.navigator.navigate(target);
        }

        decision
    }

    /// Follow auth state and location until either source goes away.
    pub async fn run(mut self) {
        loop {
            self.auth.mark_unchanged();
            self.location.mark_unchanged();
            self.check();

            let closed = tokio::select! {
                changed = self.auth.changed() => changed.is_err(),
                changed = self.location.changed() => changed.is_err(),
            };
            if closed {
                break;
            }
        }
        tracing::debug!("Protected route stopped");
    }
}
