//! Error types and handling for pathguard.
//!
//! This module defines a unified error type covering path validation, audit
//! serialization and the async guard service.

use std::time::Duration;
use thiserror::Error;

use super::security::PathSecurityError;

/// A specialized Result type for pathguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for pathguard.
#[derive(Debug, Error)]
pub enum Error {
    /// A candidate or base directory failed validation.
    #[error("Path security error: {0}")]
    Security(#[from] PathSecurityError),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation did not finish within the caller's deadline.
    #[error("Validation timed out after {0:?}")]
    Timeout(Duration),

    /// Internal errors that should not occur under normal operation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The underlying validation failure, if this is one.
    pub fn as_security(&self) -> Option<&PathSecurityError> {
        match self {
            Self::Security(e) => Some(e),
            _ => None,
        }
    }
}
