//! Tickets Backend Module
//!
//! Client for the hosted data service that stores support tickets and
//! their comments, history entries and tags.
//!
//! Clean Architecture structure:
//! - `domain/` - Records, status/priority vocabulary, repository trait
//! - `application/` - Use cases
//! - `infra/` - PostgREST implementation

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::create_ticket::{CreateTicketInput, CreateTicketUseCase};
pub use domain::repository::TicketRepository;
pub use error::{TicketError, TicketResult};
pub use infra::postgrest::PostgrestTicketRepository;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
}
