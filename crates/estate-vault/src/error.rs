//! # Vault Error Types
//!
//! Every failure of a vault operation is a named [`VaultError`] variant that
//! aborts the whole operation with no partial state change. Each variant
//! maps to a stable [`code`](VaultError::code) suitable for UI mapping and a
//! taxonomy [`category`](VaultError::category).

use estate_core::{Identity, RequestId, VaultId};
use estate_fhe::FheError;
use thiserror::Error;

use crate::condition::ConditionKind;

/// Error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The caller lacks the required role.
    Authorization,
    /// The operation is invalid in the current lifecycle state.
    State,
    /// A reference (vault, index, request) is malformed or unknown.
    Validation,
    /// A business-rule gate failed.
    Condition,
    /// A cryptographic check failed.
    Integrity,
    /// The ciphertext engine or oracle failed.
    Engine,
}

/// Errors arising from vault operations.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Caller is not the owner of the vault.
    #[error("{caller} is not the owner of {vault_id}")]
    NotOwner {
        /// The vault addressed.
        vault_id: VaultId,
        /// The rejected caller.
        caller: Identity,
    },

    /// Caller is not the configured notary.
    #[error("{caller} is not the notary")]
    NotNotary {
        /// The rejected caller.
        caller: Identity,
    },

    /// Caller has not been authorized as an executor.
    #[error("{caller} is not an authorized executor")]
    UnauthorizedExecutor {
        /// The rejected caller.
        caller: Identity,
    },

    /// The vault has already been executed.
    #[error("{vault_id} is inactive")]
    VaultInactive {
        /// The inactive vault.
        vault_id: VaultId,
    },

    /// The vault's asset has already been revealed.
    #[error("asset of {vault_id} is already revealed")]
    AlreadyRevealed {
        /// The revealed vault.
        vault_id: VaultId,
    },

    /// Instruction index past the end of the vault's instruction list.
    #[error("instruction index {index} out of range for {vault_id} ({len} instructions)")]
    IndexOutOfRange {
        /// The vault addressed.
        vault_id: VaultId,
        /// The requested index.
        index: usize,
        /// The current number of instructions.
        len: usize,
    },

    /// No pending decryption request with this identifier.
    #[error("no pending decryption request {request_id}")]
    InvalidRequest {
        /// The unknown request.
        request_id: RequestId,
    },

    /// No vault with this identifier.
    #[error("{vault_id} does not exist")]
    VaultNotFound {
        /// The unknown vault.
        vault_id: VaultId,
    },

    /// Every vault identifier has been assigned.
    #[error("vault identifiers are exhausted")]
    VaultIdsExhausted,

    /// The configured instruction bound is reached.
    #[error("{vault_id} already holds the maximum of {max} instructions")]
    InstructionLimitReached {
        /// The vault addressed.
        vault_id: VaultId,
        /// The configured bound.
        max: usize,
    },

    /// No evaluator is registered for an instruction's condition kind.
    #[error("no evaluator registered for {kind} conditions")]
    UnsupportedCondition {
        /// The condition kind without an evaluator.
        kind: ConditionKind,
    },

    /// A release condition evaluated to false.
    #[error("release condition {index} of {vault_id} is not met")]
    ConditionNotMet {
        /// The vault addressed.
        vault_id: VaultId,
        /// The first failing instruction.
        index: usize,
    },

    /// The decryption proof did not verify.
    #[error("decryption proof for {request_id} failed verification")]
    ProofVerificationFailed {
        /// The request whose response was rejected.
        request_id: RequestId,
    },

    /// A verified payload does not decode to the asset layout.
    #[error("cleartext payload for {request_id} is malformed: {reason}")]
    MalformedPayload {
        /// The request whose response was rejected.
        request_id: RequestId,
        /// Decoder diagnostic.
        reason: String,
    },

    /// Ciphertext engine or oracle failure.
    #[error("ciphertext engine error: {0}")]
    Engine(#[from] FheError),
}

impl VaultError {
    /// Stable identifier for the failure reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOwner { .. } => "NOT_OWNER",
            Self::NotNotary { .. } => "NOT_NOTARY",
            Self::UnauthorizedExecutor { .. } => "UNAUTHORIZED_EXECUTOR",
            Self::VaultInactive { .. } => "VAULT_INACTIVE",
            Self::AlreadyRevealed { .. } => "ALREADY_REVEALED",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::VaultNotFound { .. } => "VAULT_NOT_FOUND",
            Self::VaultIdsExhausted => "VAULT_IDS_EXHAUSTED",
            Self::InstructionLimitReached { .. } => "INSTRUCTION_LIMIT_REACHED",
            Self::UnsupportedCondition { .. } => "UNSUPPORTED_CONDITION",
            Self::ConditionNotMet { .. } => "CONDITION_NOT_MET",
            Self::ProofVerificationFailed { .. } => "PROOF_VERIFICATION_FAILED",
            Self::MalformedPayload { .. } => "MALFORMED_PAYLOAD",
            Self::Engine(_) => "ENGINE_FAILURE",
        }
    }

    /// Taxonomy bucket of the failure.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotOwner { .. } | Self::NotNotary { .. } | Self::UnauthorizedExecutor { .. } => {
                ErrorCategory::Authorization
            }
            Self::VaultInactive { .. }
            | Self::AlreadyRevealed { .. }
            | Self::VaultIdsExhausted
            | Self::InstructionLimitReached { .. } => ErrorCategory::State,
            Self::IndexOutOfRange { .. }
            | Self::InvalidRequest { .. }
            | Self::VaultNotFound { .. }
            | Self::UnsupportedCondition { .. } => ErrorCategory::Validation,
            Self::ConditionNotMet { .. } => ErrorCategory::Condition,
            Self::ProofVerificationFailed { .. } | Self::MalformedPayload { .. } => {
                ErrorCategory::Integrity
            }
            Self::Engine(_) => ErrorCategory::Engine,
        }
    }
}
