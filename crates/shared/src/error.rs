use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PLAN_UNAVAILABLE_MESSAGE: &str = "Selected plan is not available. Please try again.";
pub const PURCHASE_FAILED_FALLBACK: &str = "Purchase failed. Please try again.";
pub const RESTORE_FAILED_FALLBACK: &str = "Restore failed. Please try again.";

/// Failure surfaced to the user as a single acknowledgment alert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("{}", PLAN_UNAVAILABLE_MESSAGE)]
    PlanUnavailable,
    #[error("{0}")]
    PurchaseFailed(String),
}

impl PurchaseError {
    /// Builds a failure from a collaborator message, falling back to the fixed
    /// text when the message is absent or blank.
    pub fn from_collaborator(message: Option<String>) -> Self {
        match message {
            Some(message) if !message.trim().is_empty() => Self::PurchaseFailed(message),
            _ => Self::PurchaseFailed(PURCHASE_FAILED_FALLBACK.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    PaymentDeclined,
    Cancelled,
    RateLimited,
    Internal,
}

/// Error body returned by the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
