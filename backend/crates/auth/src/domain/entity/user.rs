//! User Entity
//!
//! Profile record resolved from the identity provider. The session alone
//! does not carry this metadata, so it is re-fetched on every session change.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::email::Email;

/// Provider tag reported when the provider omits one.
const DEFAULT_PROVIDER: &str = "email";

/// Identity-provider user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: Option<Email>,
    /// Set once the user followed the confirmation link
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    /// Authentication provider tag (`email`, `github`, ...)
    pub provider: Option<String>,
}

impl User {
    pub fn is_email_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }

    pub fn provider_label(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }
}
