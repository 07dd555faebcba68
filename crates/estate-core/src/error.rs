//! # Error Hierarchy
//!
//! Foundational error types, built with `thiserror`. Subsystem crates wrap
//! them in their own enums (`FheError::Canonicalization`, for example).

use thiserror::Error;

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Validation errors for identifier newtypes and timestamps.
///
/// Each variant carries the rejected input so misconfigured scenario files
/// can be diagnosed without guesswork.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Identity string is empty, too long, or contains disallowed characters.
    #[error("invalid identity: \"{0}\" (expected 1-128 characters of [A-Za-z0-9:._-])")]
    InvalidIdentity(String),

    /// Vault identifiers start at 1.
    #[error("invalid vault id: 0 (vault ids start at 1)")]
    ZeroVaultId,

    /// Timestamp string is not valid UTC ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
