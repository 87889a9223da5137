//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Resend Verification
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    /// Missing and `null` both mean "not provided"
    pub email: Option<String>,
}

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
