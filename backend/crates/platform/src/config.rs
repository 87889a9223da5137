//! Environment Configuration
//!
//! Small helpers for reading settings from the process environment, plus
//! the connection settings for the hosted backend.

use std::time::Duration;

use crate::http::ProviderError;

/// Default timeout for calls to the hosted backend.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Read a variable, treating empty values as unset.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read the first of several variables that is set.
pub fn env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| env_var(key))
}

/// Read a variable or fall back to a default.
pub fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

/// Read a whole number of seconds.
pub fn env_secs(key: &str) -> Option<Duration> {
    env_var(key)
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Connection settings for the hosted backend.
#[derive(Clone)]
pub struct ProviderSettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public (anon) API key sent on every request
    pub anon_key: String,
    pub request_timeout: Duration,
}

impl ProviderSettings {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            request_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Load from `SUPABASE_URL` / `SUPABASE_ANON_KEY`, accepting the
    /// `NEXT_PUBLIC_` prefixed names used by the web frontend as well.
    /// `PROVIDER_TIMEOUT_SECS` overrides the request timeout.
    pub fn from_env() -> Result<Self, ProviderError> {
        let url = env_any(&["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL"])
            .ok_or_else(|| ProviderError::InvalidSettings("SUPABASE_URL is not set".into()))?;
        let anon_key = env_any(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"])
            .ok_or_else(|| {
                ProviderError::InvalidSettings("SUPABASE_ANON_KEY is not set".into())
            })?;

        let mut settings = Self::new(url, anon_key);
        if let Some(timeout) = env_secs("PROVIDER_TIMEOUT_SECS") {
            settings.request_timeout = timeout;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        if !(self.url.starts_with("https://") || self.url.starts_with("http://")) {
            return Err(ProviderError::InvalidSettings(format!(
                "provider URL must be http(s): {}",
                self.url
            )));
        }
        if self.anon_key.is_empty() {
            return Err(ProviderError::InvalidSettings("anon key is empty".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
