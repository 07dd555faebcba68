//! # Ciphertext Capability Errors

use estate_core::{CanonicalizationError, RequestId};
use thiserror::Error;

/// Errors raised by arithmetic engines and decryption oracles.
#[derive(Error, Debug)]
pub enum FheError {
    /// The handle does not refer to a ciphertext known to the engine.
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(String),

    /// The handle refers to a ciphertext of a different type.
    #[error("ciphertext {handle} is not an encrypted {expected}")]
    TypeMismatch {
        /// The offending handle (hex).
        handle: String,
        /// The expected ciphertext type.
        expected: &'static str,
    },

    /// Homomorphic division by a zero plaintext divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// The oracle has no queued request with this identifier.
    #[error("no pending decryption for {0}")]
    UnknownRequest(RequestId),

    /// A cleartext payload does not decode to the expected word layout.
    #[error("malformed cleartext payload: {0}")]
    MalformedPayload(String),

    /// Oracle key material could not be parsed.
    #[error("invalid oracle key: {0}")]
    InvalidKey(String),

    /// The decryption statement could not be canonicalized for signing.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
