//! Shared Kernel - vocabulary used by every backend crate
//!
//! Kept deliberately small:
//! - Error kind, unified error type and result alias
//! - Typed identifiers for records owned by the hosted backend
//!
//! Anything that only one domain cares about belongs in that domain's crate.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
