//! Domain Layer
//!
//! Contains entities, value objects, and the collaborator traits the
//! application layer drives (identity provider gateway, navigator).

pub mod entity;
pub mod gateway;
pub mod navigator;
pub mod value_object;

// Re-exports
pub use entity::{auth_state::AuthState, session::Session, user::User};
pub use gateway::{
    AuthGateway, Credentials, SessionEvent, SessionEventKind, SessionSubscription, SignUpOutcome,
};
pub use navigator::Navigator;
