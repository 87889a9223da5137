//! Presentation Layer
//!
//! HTTP handlers, DTOs and router for the server-side boundary, plus the
//! navigation-side driver (location history and protected route).

pub mod dto;
pub mod handlers;
pub mod location;
pub mod protected_route;
pub mod router;

pub use handlers::AuthAppState;
pub use location::Location;
pub use protected_route::{ProtectedRoute, RouteView};
pub use router::{auth_router, auth_router_generic};
