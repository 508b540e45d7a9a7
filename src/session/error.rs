//! Engine error types.
//!
//! Every fallible operation returns one of these as a typed result; nothing
//! is swallowed. Duplicate webhook deliveries are NOT errors - they resolve
//! to a success no-op at the processor level.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::status::SessionStatus;

/// Session engine error taxonomy.
///
/// Error codes feed the API response envelope; HTTP statuses are suggestions
/// for the gateway layer.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Session not found")]
    NotFound,

    #[error("Session expired at {expired_at}")]
    ExpiredSession { expired_at: DateTime<Utc> },

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Metadata signature mismatch for {txn_id}")]
    SignatureMismatch { txn_id: String },

    #[error("Transfer dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Session token already in use")]
    DuplicateToken,
}

impl EngineError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::NotFound => "NOT_FOUND",
            EngineError::ExpiredSession { .. } => "EXPIRED_SESSION",
            EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
            EngineError::SignatureMismatch { .. } => "SIGNATURE_MISMATCH",
            EngineError::DispatchFailed(_) => "DISPATCH_FAILED",
            EngineError::DuplicateToken => "DUPLICATE_TOKEN",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::Validation { .. } => 400,
            EngineError::NotFound => 404,
            EngineError::ExpiredSession { .. } => 410,
            EngineError::InvalidTransition { .. } => 409,
            EngineError::SignatureMismatch { .. } => 500,
            EngineError::DispatchFailed(_) => 502,
            EngineError::DuplicateToken => 500,
        }
    }
}
