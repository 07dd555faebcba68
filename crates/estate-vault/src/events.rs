//! # Vault Event Log
//!
//! Every committed state change appends exactly one [`VaultEvent`] to the
//! [`EventLog`]. Events carry identifiers, indices and counts only; no
//! plaintext, no handle of a private value, ever appears here.
//!
//! ## Security Invariant
//!
//! Each record is individually digestable via `CanonicalBytes` +
//! `sha256_digest`. The log is bounded: once it exceeds its capacity the
//! oldest 10% of records are trimmed. Sequence numbers keep increasing across
//! trims, so a gap at the front of the log is detectable.

use estate_core::{sha256_digest, CanonicalBytes, ContentDigest, Identity, RequestId, Timestamp, VaultId};
use serde::{Deserialize, Serialize};

/// Default capacity of an [`EventLog`].
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 10_000;

// ---------------------------------------------------------------------------
// VaultEvent
// ---------------------------------------------------------------------------

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultEvent {
    /// A vault was created.
    VaultCreated {
        /// The new vault.
        vault_id: VaultId,
        /// Its owner.
        owner: Identity,
    },
    /// The vault's encrypted asset fields were replaced.
    AssetUpdated {
        /// The vault addressed.
        vault_id: VaultId,
    },
    /// An inheritance instruction was appended.
    InstructionAdded {
        /// The vault addressed.
        vault_id: VaultId,
        /// Position of the new instruction.
        index: usize,
    },
    /// An instruction's release condition was replaced.
    ConditionUpdated {
        /// The vault addressed.
        vault_id: VaultId,
        /// Position of the updated instruction.
        index: usize,
    },
    /// The notary granted executor status.
    ExecutorAuthorized {
        /// The new executor.
        executor: Identity,
    },
    /// A vault was executed and deactivated.
    InheritanceExecuted {
        /// The executed vault.
        vault_id: VaultId,
        /// The executor who triggered it.
        executor: Identity,
        /// Number of entitlements authorized.
        beneficiaries: usize,
    },
    /// The owner requested a reveal of the asset.
    DecryptionRequested {
        /// The vault addressed.
        vault_id: VaultId,
        /// The oracle request.
        request_id: RequestId,
    },
    /// A verified oracle response revealed the asset.
    AssetRevealed {
        /// The vault addressed.
        vault_id: VaultId,
        /// The request that was answered.
        request_id: RequestId,
    },
}

impl VaultEvent {
    /// Stable name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VaultCreated { .. } => "vault_created",
            Self::AssetUpdated { .. } => "asset_updated",
            Self::InstructionAdded { .. } => "instruction_added",
            Self::ConditionUpdated { .. } => "condition_updated",
            Self::ExecutorAuthorized { .. } => "executor_authorized",
            Self::InheritanceExecuted { .. } => "inheritance_executed",
            Self::DecryptionRequested { .. } => "decryption_requested",
            Self::AssetRevealed { .. } => "asset_revealed",
        }
    }

    /// The vault the event concerns, if any.
    pub fn vault_id(&self) -> Option<VaultId> {
        match self {
            Self::VaultCreated { vault_id, .. }
            | Self::AssetUpdated { vault_id }
            | Self::InstructionAdded { vault_id, .. }
            | Self::ConditionUpdated { vault_id, .. }
            | Self::InheritanceExecuted { vault_id, .. }
            | Self::DecryptionRequested { vault_id, .. }
            | Self::AssetRevealed { vault_id, .. } => Some(*vault_id),
            Self::ExecutorAuthorized { .. } => None,
        }
    }
}

impl std::fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventRecord
// ---------------------------------------------------------------------------

/// An event with its position and commit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Monotonic sequence number, starting at 1.
    pub sequence: u64,
    /// Commit time.
    pub recorded_at: Timestamp,
    /// The event.
    pub event: VaultEvent,
}

impl EventRecord {
    /// Content-addressed digest of the record.
    ///
    /// Returns `None` if canonicalization fails, which well-formed records
    /// never do.
    pub fn digest(&self) -> Option<ContentDigest> {
        match CanonicalBytes::new(self) {
            Ok(canonical) => Some(sha256_digest(&canonical)),
            Err(e) => {
                tracing::warn!(sequence = self.sequence, error = %e, "event record canonicalization failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only, bounded event log.
///
/// Records beyond capacity are trimmed oldest first. Sequence numbers are
/// never reused, so a gap before the first retained record shows where
/// trimming happened; [`EventLog::trimmed`] counts the dropped records.
pub struct EventLog {
    records: Vec<EventRecord>,
    max_entries: usize,
    next_sequence: u64,
    trimmed: u64,
}

impl EventLog {
    /// Create a log that keeps at most `max_entries` records.
    pub fn new(max_entries: usize) -> Self {
        Self {
            records: Vec::new(),
            max_entries: max_entries.max(1),
            next_sequence: 1,
            trimmed: 0,
        }
    }

    /// Append an event and return its sequence number.
    ///
    /// Trims the oldest 10% (at least one) when capacity is exceeded.
    pub fn append(&mut self, event: VaultEvent, recorded_at: Timestamp) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.records.push(EventRecord {
            sequence,
            recorded_at,
            event,
        });
        if self.records.len() > self.max_entries {
            let trim_count = (self.max_entries / 10).max(1);
            self.records.drain(..trim_count);
            self.trimmed += trim_count as u64;
            tracing::warn!(
                dropped = trim_count,
                total_dropped = self.trimmed,
                first_retained = self.records.first().map(|r| r.sequence),
                capacity = self.max_entries,
                "event log at capacity, oldest records trimmed"
            );
        }
        sequence
    }

    /// All retained records, oldest first.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records concerning one vault.
    pub fn for_vault(&self, vault_id: VaultId) -> Vec<&EventRecord> {
        self.records
            .iter()
            .filter(|r| r.event.vault_id() == Some(vault_id))
            .collect()
    }

    /// The last `n` records (or all, if fewer exist).
    pub fn last_n(&self, n: usize) -> &[EventRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Digests of all retained records, keyed by sequence number.
    pub fn compute_digests(&self) -> Vec<(u64, ContentDigest)> {
        self.records
            .iter()
            .filter_map(|r| r.digest().map(|d| (r.sequence, d)))
            .collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of records dropped by trimming.
    pub fn trimmed(&self) -> u64 {
        self.trimmed
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("records", &self.records.len())
            .field("max_entries", &self.max_entries)
            .field("next_sequence", &self.next_sequence)
            .field("trimmed", &self.trimmed)
            .finish()
    }
}
