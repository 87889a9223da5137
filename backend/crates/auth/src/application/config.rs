//! Application Configuration
//!
//! Route policy and session refresh timing for the Auth application layer.

use std::time::Duration;

use platform::config::env_secs;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Sign-in entry point; unauthenticated visitors are sent here
    pub sign_in_path: String,
    /// Sign-up entry point
    pub sign_up_path: String,
    /// Every path under this prefix is an auth-entry path
    pub auth_prefix: String,
    /// Public landing page, reachable while signed out
    pub home_path: String,
    /// Where signed-in users are sent away from the auth pages
    pub landing_path: String,
    /// Where the sign-in page goes after a successful sign-in
    pub post_sign_in_path: String,
    /// Refresh the access token when it expires within this margin
    pub refresh_margin: Duration,
    /// Tick for `GoTrueGateway::spawn_auto_refresh` in session-holding clients
    pub refresh_tick: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            sign_in_path: "/auth/signin".to_string(),
            sign_up_path: "/auth/signup".to_string(),
            auth_prefix: "/auth/".to_string(),
            home_path: "/".to_string(),
            landing_path: "/dashboard".to_string(),
            post_sign_in_path: "/tickets".to_string(),
            refresh_margin: Duration::from_secs(60),
            refresh_tick: Duration::from_secs(30),
        }
    }
}

impl AuthConfig {
    /// Defaults with `AUTH_REFRESH_MARGIN_SECS` / `AUTH_REFRESH_TICK_SECS` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(margin) = env_secs("AUTH_REFRESH_MARGIN_SECS") {
            config.refresh_margin = margin;
        }
        if let Some(tick) = env_secs("AUTH_REFRESH_TICK_SECS").filter(|t| !t.is_zero()) {
            config.refresh_tick = tick;
        }
        config
    }

    /// Where the sign-up page goes after a successful sign-up
    pub fn post_sign_up_path(&self) -> &str {
        &self.sign_in_path
    }
}
