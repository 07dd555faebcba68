//! # Asset Store
//!
//! One encrypted asset record per vault, holding three encrypted fields:
//! type, value and access key. A vault starts with all three set to an
//! encryption of zero. The plaintext record exists only after a verified
//! oracle reveal and, once revealed, is never overwritten.

use std::collections::BTreeMap;

use estate_core::{Timestamp, VaultId};
use estate_fhe::{CiphertextHandle, EncryptedU64};
use serde::{Deserialize, Serialize};

/// Number of fields in an asset record, and of words in a reveal payload.
pub const ASSET_FIELDS: usize = 3;

/// The encrypted asset fields of a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedAsset {
    /// The vault the asset belongs to.
    pub vault_id: VaultId,
    /// Asset category code.
    pub encrypted_type: EncryptedU64,
    /// Asset value.
    pub encrypted_value: EncryptedU64,
    /// Access credential.
    pub encrypted_access_key: EncryptedU64,
    /// Creation time of the record.
    pub created_at: Timestamp,
    /// Time of the last replacement.
    pub updated_at: Timestamp,
}

impl EncryptedAsset {
    /// Handles in reveal order: type, value, access key.
    pub fn handles(&self) -> [CiphertextHandle; ASSET_FIELDS] {
        [
            self.encrypted_type.handle(),
            self.encrypted_value.handle(),
            self.encrypted_access_key.handle(),
        ]
    }
}

/// Plaintext asset fields delivered by a verified reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAsset {
    /// The vault the asset belongs to.
    pub vault_id: VaultId,
    /// Asset category code.
    pub asset_type: u64,
    /// Asset value.
    pub asset_value: u64,
    /// Access credential.
    pub access_key: u64,
    /// Always `true` for a stored record.
    pub is_revealed: bool,
    /// Time of the reveal.
    pub revealed_at: Timestamp,
}

/// Encrypted asset view returned by `get_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetView {
    /// Asset category code.
    pub encrypted_type: EncryptedU64,
    /// Asset value.
    pub encrypted_value: EncryptedU64,
    /// Access credential.
    pub encrypted_access_key: EncryptedU64,
    /// The vault's active flag.
    pub active: bool,
}

/// Encrypted and revealed asset records, keyed by vault.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<VaultId, EncryptedAsset>,
    revealed: BTreeMap<VaultId, RevealedAsset>,
}

impl AssetStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn init(&mut self, vault_id: VaultId, zero: EncryptedU64, now: Timestamp) {
        self.assets.insert(
            vault_id,
            EncryptedAsset {
                vault_id,
                encrypted_type: zero,
                encrypted_value: zero,
                encrypted_access_key: zero,
                created_at: now,
                updated_at: now,
            },
        );
    }

    pub(crate) fn replace(
        &mut self,
        vault_id: VaultId,
        encrypted_type: EncryptedU64,
        encrypted_value: EncryptedU64,
        encrypted_access_key: EncryptedU64,
        now: Timestamp,
    ) {
        if let Some(asset) = self.assets.get_mut(&vault_id) {
            asset.encrypted_type = encrypted_type;
            asset.encrypted_value = encrypted_value;
            asset.encrypted_access_key = encrypted_access_key;
            asset.updated_at = now;
        }
    }

    pub(crate) fn reveal(
        &mut self,
        vault_id: VaultId,
        [asset_type, asset_value, access_key]: [u64; ASSET_FIELDS],
        now: Timestamp,
    ) {
        self.revealed.entry(vault_id).or_insert(RevealedAsset {
            vault_id,
            asset_type,
            asset_value,
            access_key,
            is_revealed: true,
            revealed_at: now,
        });
    }

    /// The encrypted record of a vault.
    pub fn get(&self, vault_id: VaultId) -> Option<&EncryptedAsset> {
        self.assets.get(&vault_id)
    }

    /// The revealed record of a vault, once revealed.
    pub fn revealed(&self, vault_id: VaultId) -> Option<&RevealedAsset> {
        self.revealed.get(&vault_id)
    }

    /// Whether the vault's asset has been revealed.
    pub fn is_revealed(&self, vault_id: VaultId) -> bool {
        self.revealed
            .get(&vault_id)
            .is_some_and(|r| r.is_revealed)
    }

    /// All encrypted records in vault order.
    pub fn iter(&self) -> impl Iterator<Item = &EncryptedAsset> {
        self.assets.values()
    }

    /// All revealed records in vault order.
    pub fn iter_revealed(&self) -> impl Iterator<Item = &RevealedAsset> {
        self.revealed.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn ct(b: u8) -> EncryptedU64 {
        EncryptedU64::from_handle(CiphertextHandle::from_bytes([b; 32]))
    }

    fn vid() -> VaultId {
        VaultId::new(1).unwrap()
    }

    #[test]
    fn init_sets_all_fields_to_zero() {
        let mut store = AssetStore::new();
        store.init(vid(), ct(0), ts("2026-01-01T00:00:00Z"));
        let asset = store.get(vid()).unwrap();
        assert_eq!(asset.encrypted_type, ct(0));
        assert_eq!(asset.encrypted_value, ct(0));
        assert_eq!(asset.encrypted_access_key, ct(0));
        assert!(!store.is_revealed(vid()));
    }

    #[test]
    fn replace_updates_fields_and_time() {
        let mut store = AssetStore::new();
        store.init(vid(), ct(0), ts("2026-01-01T00:00:00Z"));
        store.replace(vid(), ct(1), ct(2), ct(3), ts("2026-02-01T00:00:00Z"));
        let asset = store.get(vid()).unwrap();
        assert_eq!(asset.handles(), [ct(1).handle(), ct(2).handle(), ct(3).handle()]);
        assert_eq!(asset.created_at, ts("2026-01-01T00:00:00Z"));
        assert_eq!(asset.updated_at, ts("2026-02-01T00:00:00Z"));
    }

    #[test]
    fn reveal_is_write_once() {
        let mut store = AssetStore::new();
        store.init(vid(), ct(0), ts("2026-01-01T00:00:00Z"));
        store.reveal(vid(), [1, 2000, 42], ts("2026-03-01T00:00:00Z"));
        store.reveal(vid(), [9, 9, 9], ts("2026-04-01T00:00:00Z"));
        let r = store.revealed(vid()).unwrap();
        assert_eq!((r.asset_type, r.asset_value, r.access_key), (1, 2000, 42));
        assert!(r.is_revealed);
        assert!(store.is_revealed(vid()));
    }
}
