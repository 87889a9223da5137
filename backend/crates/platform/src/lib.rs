//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Environment-driven configuration helpers
//! - The HTTP client used to talk to the hosted backend (identity
//!   provider and REST data API), including error-body decoding

pub mod config;
pub mod http;

pub use config::ProviderSettings;
pub use http::{ProviderClient, ProviderError};
