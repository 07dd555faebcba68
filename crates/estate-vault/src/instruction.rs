//! # Inheritance Instructions
//!
//! Each vault holds an ordered list of instructions. An instruction names an
//! encrypted beneficiary, an encrypted share (a percentage, meaningful in
//! `0..=100`), and an encrypted release condition. Position in the list is
//! the instruction's identity: indices are stable, entries are never removed
//! or reordered.
//!
//! Shares are not validated on insert. [`total_share_check`] computes an
//! encrypted "shares sum to exactly 100" bit that clients may reveal if they
//! want to confirm a well-formed plan.

use std::collections::BTreeMap;

use estate_core::VaultId;
use estate_fhe::{CiphertextArithmetic, EncryptedBool, EncryptedU64, FheError};
use serde::{Deserialize, Serialize};

use crate::condition::ConditionKind;
use crate::error::VaultError;

/// The whole to which shares are expected to sum.
pub const SHARE_DENOMINATOR: u64 = 100;

/// One beneficiary's encrypted allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceInstruction {
    /// Beneficiary identity code.
    pub encrypted_beneficiary: EncryptedU64,
    /// Percentage of the asset value.
    pub encrypted_share: EncryptedU64,
    /// Release condition parameter.
    pub encrypted_release_condition: EncryptedU64,
    /// How the release condition is interpreted.
    #[serde(default)]
    pub condition_kind: ConditionKind,
}

/// Instruction lists, keyed by vault.
#[derive(Debug, Clone, Default)]
pub struct InstructionLedger {
    by_vault: BTreeMap<VaultId, Vec<InheritanceInstruction>>,
}

impl InstructionLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn init(&mut self, vault_id: VaultId) {
        self.by_vault.entry(vault_id).or_default();
    }

    /// Instructions of a vault in insertion order; empty for unknown vaults.
    pub fn instructions(&self, vault_id: VaultId) -> &[InheritanceInstruction] {
        self.by_vault
            .get(&vault_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of instructions of a vault.
    pub fn count(&self, vault_id: VaultId) -> usize {
        self.instructions(vault_id).len()
    }

    pub(crate) fn append(&mut self, vault_id: VaultId, instruction: InheritanceInstruction) -> usize {
        let list = self.by_vault.entry(vault_id).or_default();
        list.push(instruction);
        list.len() - 1
    }

    pub(crate) fn check_index(&self, vault_id: VaultId, index: usize) -> Result<(), VaultError> {
        let len = self.count(vault_id);
        if index >= len {
            return Err(VaultError::IndexOutOfRange {
                vault_id,
                index,
                len,
            });
        }
        Ok(())
    }

    pub(crate) fn replace_condition(
        &mut self,
        vault_id: VaultId,
        index: usize,
        condition: EncryptedU64,
    ) -> Result<(), VaultError> {
        self.check_index(vault_id, index)?;
        if let Some(instruction) = self
            .by_vault
            .get_mut(&vault_id)
            .and_then(|list| list.get_mut(index))
        {
            instruction.encrypted_release_condition = condition;
        }
        Ok(())
    }

    /// All lists in vault order.
    pub fn iter(&self) -> impl Iterator<Item = (&VaultId, &Vec<InheritanceInstruction>)> {
        self.by_vault.iter()
    }
}

/// Encrypted bit: do the shares of `instructions` sum to exactly 100?
///
/// The sum uses wrapping 64-bit addition. An empty list sums to zero.
pub fn total_share_check(
    engine: &dyn CiphertextArithmetic,
    instructions: &[InheritanceInstruction],
) -> Result<EncryptedBool, FheError> {
    let mut total = engine.encrypt_trivial(0)?;
    for instruction in instructions {
        total = engine.add(&total, &instruction.encrypted_share)?;
    }
    let whole = engine.encrypt_trivial(SHARE_DENOMINATOR)?;
    engine.equal(&total, &whole)
}
