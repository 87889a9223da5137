//! Infrastructure Layer
//!
//! Data service implementation of the repository trait.

pub mod postgrest;

pub use postgrest::PostgrestTicketRepository;
