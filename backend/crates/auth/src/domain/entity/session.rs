//! Session Entity
//!
//! Credential bundle issued by the identity provider. Opaque to this
//! crate apart from its expiry and the user it belongs to.

use std::time::Duration;

use chrono::{DateTime, Utc};
use kernel::id::UserId;

/// Provider-issued session
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for provider calls
    pub access_token: String,
    /// Used to obtain a fresh access token before expiry
    pub refresh_token: Option<String>,
    /// Usually `bearer`
    pub token_type: String,
    /// `None` when the provider did not say
    pub expires_at: Option<DateTime<Utc>>,
    /// Owner of the session
    pub user_id: UserId,
}

impl Session {
    /// Check if the access token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| (at - Utc::now()).to_std().unwrap_or(Duration::ZERO))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
