//! # Distribution
//!
//! On execution each instruction yields an [`Entitlement`]: the encrypted
//! amount `floor(asset_value * share / 100)` for its encrypted beneficiary.
//! The multiplication wraps at 64 bits. Entitlements are recorded against
//! the vault and are the only persisted output of execution; actual transfer
//! of value happens outside this system.

use std::collections::BTreeMap;

use estate_core::VaultId;
use estate_fhe::{CiphertextArithmetic, EncryptedU64, FheError};
use serde::{Deserialize, Serialize};

use crate::instruction::{InheritanceInstruction, SHARE_DENOMINATOR};

/// An authorized encrypted amount for one beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    /// Position of the originating instruction.
    pub index: usize,
    /// Beneficiary identity code.
    pub encrypted_beneficiary: EncryptedU64,
    /// `floor(asset_value * share / 100)`.
    pub encrypted_share_value: EncryptedU64,
}

/// Compute entitlements for every instruction, in order.
pub fn compute_entitlements(
    engine: &dyn CiphertextArithmetic,
    asset_value: &EncryptedU64,
    instructions: &[InheritanceInstruction],
) -> Result<Vec<Entitlement>, FheError> {
    instructions
        .iter()
        .enumerate()
        .map(|(index, instruction)| {
            let product = engine.mul(asset_value, &instruction.encrypted_share)?;
            let share_value = engine.div(&product, SHARE_DENOMINATOR)?;
            Ok(Entitlement {
                index,
                encrypted_beneficiary: instruction.encrypted_beneficiary,
                encrypted_share_value: share_value,
            })
        })
        .collect()
}

/// Recorded entitlements, keyed by executed vault.
#[derive(Debug, Clone, Default)]
pub struct DistributionLedger {
    by_vault: BTreeMap<VaultId, Vec<Entitlement>>,
}

impl DistributionLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, vault_id: VaultId, entitlements: Vec<Entitlement>) {
        self.by_vault.insert(vault_id, entitlements);
    }

    /// Entitlements of an executed vault; empty otherwise.
    pub fn get(&self, vault_id: VaultId) -> &[Entitlement] {
        self.by_vault
            .get(&vault_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All records in vault order.
    pub fn iter(&self) -> impl Iterator<Item = (&VaultId, &Vec<Entitlement>)> {
        self.by_vault.iter()
    }
}
