//! Entity Module

pub mod auth_state;
pub mod session;
pub mod user;
