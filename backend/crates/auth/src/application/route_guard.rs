//! Route Guard
//!
//! Pure navigation policy: `(AuthState, path) -> GuardDecision`. Performing
//! the redirect is left to the caller (see `presentation::protected_route`).

use crate::application::config::AuthConfig;
use crate::domain::entity::auth_state::AuthState;

/// How a path is treated by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// Sign-in, sign-up and everything under the auth prefix
    AuthEntry,
    /// Public landing page
    Home,
    /// Everything else
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Still resolving; render the loading placeholder, do not navigate
    Pending,
    Allow,
    Redirect(String),
}

impl GuardDecision {
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect(path) => Some(path),
            _ => None,
        }
    }
}

/// Path without query string, fragment or trailing slash.
pub fn normalize_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path[..end].trim_end_matches('/');
    if path.is_empty() { "/" } else { path }
}

pub fn classify(path: &str, config: &AuthConfig) -> PathClass {
    let under_prefix = path.starts_with(&config.auth_prefix);
    let path = normalize_path(path);

    if under_prefix
        || path == normalize_path(&config.sign_in_path)
        || path == normalize_path(&config.sign_up_path)
    {
        PathClass::AuthEntry
    } else if path == normalize_path(&config.home_path) {
        PathClass::Home
    } else {
        PathClass::Protected
    }
}

/// Decide what to do with a navigation to `path`.
///
/// | state           | path class   | decision                |
/// |-----------------|--------------|-------------------------|
/// | Loading         | any          | Pending                 |
/// | Unauthenticated | auth entry   | Allow                   |
/// | Unauthenticated | home         | Allow                   |
/// | Unauthenticated | other        | Redirect(sign-in)       |
/// | Authenticated   | auth entry   | Redirect(landing)       |
/// | Authenticated   | other        | Allow                   |
///
/// A redirect that would land on the current path is turned into `Allow`
/// so a misconfigured policy can never loop or lock users out.
pub fn evaluate(state: &AuthState, path: &str, config: &AuthConfig) -> GuardDecision {
    let class = classify(path, config);

    let target = match (state, class) {
        (AuthState::Loading, _) => return GuardDecision::Pending,
        (AuthState::Unauthenticated, PathClass::AuthEntry | PathClass::Home) => None,
        (AuthState::Unauthenticated, PathClass::Protected) => Some(&config.sign_in_path),
        (AuthState::Authenticated { .. }, PathClass::AuthEntry) => Some(&config.landing_path),
        (AuthState::Authenticated { .. }, _) => None,
    };

    match target {
        Some(target) if normalize_path(target) != normalize_path(path) => {
            GuardDecision::Redirect(target.clone())
        }
        _ => GuardDecision::Allow,
    }
}
