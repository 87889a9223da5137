//! Infrastructure Layer
//!
//! Identity provider integration.

pub mod gotrue;

pub use gotrue::GoTrueGateway;
