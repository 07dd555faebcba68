//! # Decryption Bridge
//!
//! Correlates asynchronous oracle responses with the vault they were
//! requested for. A pending entry records the exact handles submitted, so a
//! response is verified against what was asked, not against whatever the
//! asset holds by the time the callback arrives.
//!
//! A successful callback consumes its entry. Entries have no expiry.

use std::collections::BTreeMap;

use estate_core::{RequestId, Timestamp, VaultId};
use estate_fhe::CiphertextHandle;
use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// An outstanding reveal request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDecryption {
    /// Oracle request identifier.
    pub request_id: RequestId,
    /// The vault whose asset is being revealed.
    pub vault_id: VaultId,
    /// Handles submitted to the oracle, in payload order.
    pub handles: Vec<CiphertextHandle>,
    /// When the request was made.
    pub requested_at: Timestamp,
}

/// Pending reveal requests, keyed by request id.
#[derive(Debug, Clone, Default)]
pub struct DecryptionBridge {
    pending: BTreeMap<RequestId, PendingDecryption>,
}

impl DecryptionBridge {
    /// No pending requests.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, pending: PendingDecryption) {
        self.pending.insert(pending.request_id, pending);
    }

    /// The pending entry for `request_id`.
    pub fn require(&self, request_id: RequestId) -> Result<&PendingDecryption, VaultError> {
        self.pending
            .get(&request_id)
            .ok_or(VaultError::InvalidRequest { request_id })
    }

    pub(crate) fn consume(&mut self, request_id: RequestId) -> Option<PendingDecryption> {
        self.pending.remove(&request_id)
    }

    /// All pending entries, oldest request first.
    pub fn pending(&self) -> impl Iterator<Item = &PendingDecryption> {
        self.pending.values()
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
