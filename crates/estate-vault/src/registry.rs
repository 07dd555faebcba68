//! # Vault Registry
//!
//! Allocates vault identifiers, records ownership, and tracks the
//! active/inactive lifecycle flag.
//!
//! ```text
//!   create ──▶ ACTIVE ──(execute_inheritance)──▶ INACTIVE (terminal)
//! ```
//!
//! Identifiers start at 1 and are never reused. The owner index lists each
//! owner's vaults in creation order.

use std::collections::BTreeMap;

use estate_core::{Identity, Timestamp, VaultId};
use serde::{Deserialize, Serialize};

use crate::error::VaultError;

/// A vault header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Identifier.
    pub id: VaultId,
    /// Owner, immutable after creation.
    pub owner: Identity,
    /// `false` once the vault has been executed.
    pub active: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Execution time, once executed.
    pub executed_at: Option<Timestamp>,
}

impl Vault {
    /// Whether `caller` owns this vault.
    pub fn is_owned_by(&self, caller: &Identity) -> bool {
        &self.owner == caller
    }
}

/// Vault headers and the owner index.
#[derive(Debug, Clone)]
pub struct VaultRegistry {
    next_id: Option<VaultId>,
    vaults: BTreeMap<VaultId, Vault>,
    owner_index: BTreeMap<Identity, Vec<VaultId>>,
}

impl Default for VaultRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultRegistry {
    /// Empty registry; the first vault gets id 1.
    pub fn new() -> Self {
        Self {
            next_id: Some(VaultId::FIRST),
            vaults: BTreeMap::new(),
            owner_index: BTreeMap::new(),
        }
    }

    /// The identifier the next created vault will receive; `None` once the
    /// id space is used up.
    pub fn next_id(&self) -> Option<VaultId> {
        self.next_id
    }

    pub(crate) fn create(
        &mut self,
        owner: Identity,
        now: Timestamp,
    ) -> Result<VaultId, VaultError> {
        let id = self.next_id.ok_or(VaultError::VaultIdsExhausted)?;
        self.next_id = id.next();
        self.owner_index.entry(owner.clone()).or_default().push(id);
        self.vaults.insert(
            id,
            Vault {
                id,
                owner,
                active: true,
                created_at: now,
                executed_at: None,
            },
        );
        Ok(id)
    }

    pub(crate) fn deactivate(&mut self, id: VaultId, now: Timestamp) {
        if let Some(vault) = self.vaults.get_mut(&id) {
            vault.active = false;
            vault.executed_at = Some(now);
        }
    }

    /// Look up a vault.
    pub fn get(&self, id: VaultId) -> Option<&Vault> {
        self.vaults.get(&id)
    }

    /// Look up a vault that must exist.
    pub fn require(&self, id: VaultId) -> Result<&Vault, VaultError> {
        self.vaults
            .get(&id)
            .ok_or(VaultError::VaultNotFound { vault_id: id })
    }

    /// Look up a vault that must exist and be owned by `caller`.
    pub fn require_owner(&self, id: VaultId, caller: &Identity) -> Result<&Vault, VaultError> {
        let vault = self.require(id)?;
        if !vault.is_owned_by(caller) {
            return Err(VaultError::NotOwner {
                vault_id: id,
                caller: caller.clone(),
            });
        }
        Ok(vault)
    }

    /// Vaults of `owner` in creation order; empty for unknown owners.
    pub fn owner_vaults(&self, owner: &Identity) -> &[VaultId] {
        self.owner_index
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All vaults in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Vault> {
        self.vaults.values()
    }

    /// The full owner index.
    pub fn owner_index(&self) -> &BTreeMap<Identity, Vec<VaultId>> {
        &self.owner_index
    }

    /// Number of vaults.
    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    /// Whether no vault exists.
    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ts() -> Timestamp {
        Timestamp::parse("2026-01-15T12:00:00Z").unwrap()
    }

    fn id(s: &str) -> Identity {
        Identity::new(s).unwrap()
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut reg = VaultRegistry::new();
        let a = reg.create(id("alice"), ts()).unwrap();
        let b = reg.create(id("bob"), ts()).unwrap();
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 2);
        assert_eq!(reg.next_id().map(|v| v.get()), Some(3));
    }

    #[test]
    fn owner_index_in_creation_order() {
        let mut reg = VaultRegistry::new();
        let a1 = reg.create(id("alice"), ts()).unwrap();
        reg.create(id("bob"), ts()).unwrap();
        let a2 = reg.create(id("alice"), ts()).unwrap();
        assert_eq!(reg.owner_vaults(&id("alice")), &[a1, a2]);
        assert!(reg.owner_vaults(&id("carol")).is_empty());
    }

    #[test]
    fn new_vault_is_active() {
        let mut reg = VaultRegistry::new();
        let v = reg.create(id("alice"), ts()).unwrap();
        let vault = reg.get(v).unwrap();
        assert!(vault.active);
        assert!(vault.executed_at.is_none());
    }

    #[test]
    fn deactivate_records_time() {
        let mut reg = VaultRegistry::new();
        let v = reg.create(id("alice"), ts()).unwrap();
        reg.deactivate(v, ts());
        let vault = reg.get(v).unwrap();
        assert!(!vault.active);
        assert_eq!(vault.executed_at, Some(ts()));
    }

    #[test]
    fn require_owner_checks() {
        let mut reg = VaultRegistry::new();
        let v = reg.create(id("alice"), ts()).unwrap();
        assert!(reg.require_owner(v, &id("alice")).is_ok());
        assert!(matches!(
            reg.require_owner(v, &id("bob")),
            Err(VaultError::NotOwner { .. })
        ));
        let missing = VaultId::new(99).unwrap();
        assert!(matches!(
            reg.require(missing),
            Err(VaultError::VaultNotFound { .. })
        ));
    }

    #[test]
    fn create_refuses_to_reuse_the_last_id() {
        let mut reg = VaultRegistry::new();
        reg.next_id = Some(VaultId::new(u64::MAX).unwrap());
        let last = reg.create(id("alice"), ts()).unwrap();
        assert_eq!(last.get(), u64::MAX);
        assert!(reg.next_id().is_none());

        let err = reg.create(id("bob"), ts()).unwrap_err();
        assert!(matches!(err, VaultError::VaultIdsExhausted));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(last).unwrap().owner, id("alice"));
        assert!(reg.owner_vaults(&id("bob")).is_empty());
    }

    proptest! {
        #[test]
        fn ids_dense_and_index_consistent(owners in proptest::collection::vec(0usize..4, 1..40)) {
            let names = ["alice", "bob", "carol", "dave"];
            let mut reg = VaultRegistry::new();
            let mut created = Vec::new();
            for o in &owners {
                created.push(reg.create(id(names[*o]), ts()).unwrap());
            }
            for (i, v) in created.iter().enumerate() {
                prop_assert_eq!(v.get(), i as u64 + 1);
            }
            let indexed: usize = reg.owner_index().values().map(Vec::len).sum();
            prop_assert_eq!(indexed, created.len());
            for (owner, ids) in reg.owner_index() {
                for v in ids {
                    prop_assert_eq!(&reg.get(*v).unwrap().owner, owner);
                }
                prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}
