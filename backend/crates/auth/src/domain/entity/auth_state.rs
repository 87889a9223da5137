//! Auth State
//!
//! Tri-state classification of the application's authentication status.
//! User and session travel together in `Authenticated` so they can only be
//! replaced as a pair.

use crate::domain::entity::{session::Session, user::User};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// Session resolution in flight
    #[default]
    Loading,
    Authenticated {
        user: User,
        session: Session,
    },
    Unauthenticated,
}

impl AuthState {
    pub fn authenticated(user: User, session: Session) -> Self {
        AuthState::Authenticated { user, session }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Short name for logs.
    pub fn label(&self) -> &'static str {
        match self {
            AuthState::Loading => "loading",
            AuthState::Authenticated { .. } => "authenticated",
            AuthState::Unauthenticated => "unauthenticated",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kernel::id::UserId;

    #[test]
    fn test_default_is_loading() {
        let state = AuthState::default();
        assert!(state.is_loading());
        assert!(state.user().is_none());
        assert_eq!(state.label(), "loading");
    }

    #[test]
    fn test_authenticated_accessors() {
        let id = UserId::new();
        let user = User {
            id,
            email: None,
            email_confirmed_at: None,
            created_at: Utc::now(),
            last_sign_in_at: None,
            provider: None,
        };
        let session = Session {
            access_token: "a".into(),
            refresh_token: None,
            token_type: "bearer".into(),
            expires_at: None,
            user_id: id,
        };

        let state = AuthState::authenticated(user, session);
        assert!(state.is_authenticated());
        assert_eq!(state.user().map(|u| u.id), Some(id));
        assert_eq!(state.session().map(|s| s.user_id), Some(id));
        assert!(!AuthState::Unauthenticated.is_authenticated());
    }
}
