//! Navigator
//!
//! The side-effect seam for redirects. The controller and the route guard
//! driver never change location themselves; they ask a [`Navigator`].

/// Performs client-side navigation.
pub trait Navigator: Send + Sync {
    /// Replace the current location with `path`.
    fn navigate(&self, path: &str);
}

