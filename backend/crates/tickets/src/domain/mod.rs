//! Domain Layer
//!
//! This layer contains:
//! - Ticket records and their related rows (comments, history, tags)
//! - Status and priority vocabulary
//! - Repository trait (interface)

pub mod entities;
pub mod repository;
pub mod value_objects;
