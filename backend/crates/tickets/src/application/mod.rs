//! Application Layer
//!
//! Use cases.

pub mod create_ticket;

pub use create_ticket::{CreateTicketInput, CreateTicketUseCase};
