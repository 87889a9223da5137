//! Auth (Authentication) Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, gateway and navigator traits
//! - `application/` - Session store, session controller, route guard, use cases
//! - `infra/` - Identity provider (GoTrue) implementation
//! - `presentation/` - HTTP handlers, DTOs, router, protected-route driver
//!
//! ## Session lifecycle
//! - `AuthState` starts `Loading` and moves to `Authenticated` or
//!   `Unauthenticated` only through the `SessionController`
//! - One standing subscription to provider session changes per controller
//! - The most recently started resolution wins; sign-out wins over
//!   anything in flight
//!
//! ## Route policy
//! - Signed-out visitors may only see the auth pages and the home page
//! - Signed-in users are sent from the auth pages to the dashboard
//! - No redirect is issued while the session is still resolving

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::session_controller::SessionController;
pub use domain::entity::auth_state::AuthState;
pub use error::{AuthError, AuthResult};
pub use infra::gotrue::GoTrueGateway;
pub use presentation::router::auth_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::{auth_state::*, session::*, user::*};
    pub use crate::domain::value_object::email::*;
    pub use crate::presentation::dto::*;
}

pub mod guard {
    pub use crate::application::route_guard::*;
    pub use crate::presentation::location::Location;
    pub use crate::presentation::protected_route::{ProtectedRoute, RouteView};
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod router {
    pub use crate::presentation::router::*;
}

#[cfg(test)]
mod testing;
