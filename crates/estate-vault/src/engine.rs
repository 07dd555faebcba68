//! # Inheritance Engine
//!
//! The transactional facade over every vault component. Each operation is
//! an atomic transition on the whole state: it either commits every write
//! and appends exactly one event, or fails with a [`VaultError`] and leaves
//! the state untouched.
//!
//! ## Security Invariant
//!
//! Every operation runs in two phases. The check phase is read-only and
//! performs all fallible work, including homomorphic computation, condition
//! reveals and proof verification. The commit phase only writes and cannot
//! fail. No plaintext is logged or emitted.
//!
//! ## Lifecycle
//!
//! ```text
//!   create_vault ──▶ ACTIVE ──(execute_inheritance)──▶ INACTIVE
//!                      │                                  │
//!                      └──── request_asset_decryption ────┘
//!                                     │
//!                          on_decryption_callback
//!                                     ▼
//!                                 REVEALED
//! ```

use std::collections::BTreeMap;

use estate_core::{
    sha256_digest, CanonicalBytes, CanonicalizationError, ContentDigest, Identity, RequestId,
    Timestamp, VaultId,
};
use estate_fhe::{
    CallbackSelector, CiphertextArithmetic, CiphertextHandle, CleartextPayload, DecryptionOracle,
    DecryptionProof, EncryptedBool, EncryptedU64,
};
use serde::{Deserialize, Serialize};

use crate::asset::{AssetStore, AssetView, EncryptedAsset, RevealedAsset, ASSET_FIELDS};
use crate::authority::ExecutorAuthority;
use crate::condition::{Clock, ConditionEvaluator, ConditionEvaluators, ConditionKind, SystemClock};
use crate::config::{ConfigError, VaultConfig};
use crate::distribution::{compute_entitlements, DistributionLedger, Entitlement};
use crate::error::VaultError;
use crate::events::{EventLog, VaultEvent};
use crate::instruction::{total_share_check, InheritanceInstruction, InstructionLedger};
use crate::oracle_bridge::{DecryptionBridge, PendingDecryption};
use crate::registry::{Vault, VaultRegistry};

fn logged<T>(operation: &'static str, result: Result<T, VaultError>) -> Result<T, VaultError> {
    if let Err(err) = &result {
        tracing::warn!(operation, code = err.code(), error = %err, "operation rejected");
    }
    result
}

// ---------------------------------------------------------------------------
// Receipts and snapshots
// ---------------------------------------------------------------------------

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// The executed vault.
    pub vault_id: VaultId,
    /// The executor who triggered it.
    pub executor: Identity,
    /// Commit time.
    pub executed_at: Timestamp,
    /// Authorized encrypted amounts, in instruction order.
    pub entitlements: Vec<Entitlement>,
}

/// A comparable copy of the complete vault state.
///
/// Excludes the event log, which only grows on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// Identifier the next vault will receive, if any remain.
    pub next_vault_id: Option<VaultId>,
    /// The notary.
    pub notary: Identity,
    /// Authorized executors in identity order.
    pub executors: Vec<Identity>,
    /// Vault headers in identifier order.
    pub vaults: Vec<Vault>,
    /// Owner to vaults, in creation order.
    pub owner_index: BTreeMap<Identity, Vec<VaultId>>,
    /// Encrypted asset records.
    pub assets: Vec<EncryptedAsset>,
    /// Revealed asset records.
    pub revealed: Vec<RevealedAsset>,
    /// Instruction lists.
    pub instructions: BTreeMap<VaultId, Vec<InheritanceInstruction>>,
    /// Recorded entitlements of executed vaults.
    pub distributions: BTreeMap<VaultId, Vec<Entitlement>>,
    /// Outstanding reveal requests.
    pub pending: Vec<PendingDecryption>,
}

impl VaultSnapshot {
    /// Content digest of the snapshot.
    pub fn digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        Ok(sha256_digest(&CanonicalBytes::new(self)?))
    }
}

// ---------------------------------------------------------------------------
// InheritanceEngine
// ---------------------------------------------------------------------------

/// Vault state machine over a ciphertext engine `E` and a decryption
/// oracle `O`.
pub struct InheritanceEngine<E, O> {
    config: VaultConfig,
    fhe: E,
    oracle: O,
    clock: Box<dyn Clock>,
    evaluators: ConditionEvaluators,
    registry: VaultRegistry,
    assets: AssetStore,
    ledger: InstructionLedger,
    authority: ExecutorAuthority,
    distributions: DistributionLedger,
    bridge: DecryptionBridge,
    events: EventLog,
}

impl<E: CiphertextArithmetic, O: DecryptionOracle> InheritanceEngine<E, O> {
    /// Create an engine with the system clock and the standard evaluators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration fails validation.
    pub fn new(config: VaultConfig, fhe: E, oracle: O) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            authority: ExecutorAuthority::new(config.notary.clone()),
            events: EventLog::new(config.event_log_capacity),
            config,
            fhe,
            oracle,
            clock: Box::new(SystemClock),
            evaluators: ConditionEvaluators::standard(),
            registry: VaultRegistry::new(),
            assets: AssetStore::new(),
            ledger: InstructionLedger::new(),
            distributions: DistributionLedger::new(),
            bridge: DecryptionBridge::new(),
        })
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Register a condition evaluator, replacing the one for its kind.
    pub fn with_evaluator(mut self, evaluator: Box<dyn ConditionEvaluator>) -> Self {
        self.evaluators.register(evaluator);
        self
    }

    /// Replace the whole evaluator set.
    pub fn with_evaluators(mut self, evaluators: ConditionEvaluators) -> Self {
        self.evaluators = evaluators;
        self
    }

    /// The ciphertext engine.
    pub fn fhe(&self) -> &E {
        &self.fhe
    }

    /// The decryption oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The active configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    fn emit(&mut self, event: VaultEvent, now: Timestamp) {
        let sequence = self.events.append(event, now);
        tracing::trace!(sequence, "event recorded");
    }

    // -- Vault registry ----------------------------------------------------

    /// Create a vault owned by `owner`, with all asset fields set to an
    /// encryption of zero and no instructions.
    pub fn create_vault(&mut self, owner: Identity) -> Result<VaultId, VaultError> {
        let zero = logged("create_vault", self.fhe.encrypt_trivial(0).map_err(VaultError::from))?;

        let now = self.clock.now();
        let vault_id = logged("create_vault", self.registry.create(owner.clone(), now))?;
        self.assets.init(vault_id, zero, now);
        self.ledger.init(vault_id);
        tracing::info!(%vault_id, %owner, "vault created");
        self.emit(VaultEvent::VaultCreated { vault_id, owner }, now);
        Ok(vault_id)
    }

    /// Vaults owned by `owner`, in creation order.
    pub fn get_owner_vaults(&self, owner: &Identity) -> &[VaultId] {
        self.registry.owner_vaults(owner)
    }

    /// A vault header.
    pub fn get_vault(&self, vault_id: VaultId) -> Option<&Vault> {
        self.registry.get(vault_id)
    }

    // -- Asset store -------------------------------------------------------

    /// Replace all three encrypted asset fields.
    pub fn set_asset(
        &mut self,
        vault_id: VaultId,
        encrypted_type: EncryptedU64,
        encrypted_value: EncryptedU64,
        encrypted_access_key: EncryptedU64,
        caller: &Identity,
    ) -> Result<(), VaultError> {
        logged("set_asset", self.check_owner_active(vault_id, caller))?;

        let now = self.clock.now();
        self.assets.replace(
            vault_id,
            encrypted_type,
            encrypted_value,
            encrypted_access_key,
            now,
        );
        tracing::info!(%vault_id, "asset updated");
        self.emit(VaultEvent::AssetUpdated { vault_id }, now);
        Ok(())
    }

    fn check_owner_active(&self, vault_id: VaultId, caller: &Identity) -> Result<(), VaultError> {
        let vault = self.registry.require_owner(vault_id, caller)?;
        if !vault.active {
            return Err(VaultError::VaultInactive { vault_id });
        }
        Ok(())
    }

    /// The encrypted asset fields and the active flag.
    pub fn get_asset(&self, vault_id: VaultId) -> Option<AssetView> {
        let vault = self.registry.get(vault_id)?;
        let asset = self.assets.get(vault_id)?;
        Some(AssetView {
            encrypted_type: asset.encrypted_type,
            encrypted_value: asset.encrypted_value,
            encrypted_access_key: asset.encrypted_access_key,
            active: vault.active,
        })
    }

    /// The revealed plaintext asset, once revealed.
    pub fn get_revealed_asset(&self, vault_id: VaultId) -> Option<&RevealedAsset> {
        self.assets.revealed(vault_id)
    }

    // -- Instructions ------------------------------------------------------

    /// Append a time-locked instruction. Returns its index.
    pub fn add_instruction(
        &mut self,
        vault_id: VaultId,
        encrypted_beneficiary: EncryptedU64,
        encrypted_share: EncryptedU64,
        encrypted_release_condition: EncryptedU64,
        caller: &Identity,
    ) -> Result<usize, VaultError> {
        self.add_instruction_of_kind(
            vault_id,
            InheritanceInstruction {
                encrypted_beneficiary,
                encrypted_share,
                encrypted_release_condition,
                condition_kind: ConditionKind::TimeLock,
            },
            caller,
        )
    }

    /// Append an instruction with an explicit condition kind.
    pub fn add_instruction_of_kind(
        &mut self,
        vault_id: VaultId,
        instruction: InheritanceInstruction,
        caller: &Identity,
    ) -> Result<usize, VaultError> {
        logged("add_instruction", self.check_add_instruction(vault_id, caller))?;

        let now = self.clock.now();
        let index = self.ledger.append(vault_id, instruction);
        tracing::info!(%vault_id, index, "instruction added");
        self.emit(VaultEvent::InstructionAdded { vault_id, index }, now);
        Ok(index)
    }

    fn check_add_instruction(&self, vault_id: VaultId, caller: &Identity) -> Result<(), VaultError> {
        self.registry.require_owner(vault_id, caller)?;
        if let Some(max) = self.config.max_instructions {
            if self.ledger.count(vault_id) >= max {
                return Err(VaultError::InstructionLimitReached { vault_id, max });
            }
        }
        Ok(())
    }

    /// Replace the release condition of instruction `index`.
    pub fn update_condition(
        &mut self,
        vault_id: VaultId,
        index: usize,
        new_condition: EncryptedU64,
        caller: &Identity,
    ) -> Result<(), VaultError> {
        let checked = self
            .registry
            .require_owner(vault_id, caller)
            .map(|_| ())
            .and_then(|()| self.ledger.check_index(vault_id, index));
        logged("update_condition", checked)?;

        let now = self.clock.now();
        self.ledger.replace_condition(vault_id, index, new_condition)?;
        tracing::info!(%vault_id, index, "release condition updated");
        self.emit(VaultEvent::ConditionUpdated { vault_id, index }, now);
        Ok(())
    }

    /// Instructions of a vault in insertion order.
    pub fn get_instructions(&self, vault_id: VaultId) -> &[InheritanceInstruction] {
        self.ledger.instructions(vault_id)
    }

    /// Encrypted bit: do the vault's shares sum to exactly 100?
    ///
    /// Advisory only; execution does not consult it. An unknown vault has no
    /// instructions and so yields an encryption of `false`.
    pub fn total_share_check(&self, vault_id: VaultId) -> Result<EncryptedBool, VaultError> {
        Ok(total_share_check(
            &self.fhe,
            self.ledger.instructions(vault_id),
        )?)
    }

    // -- Executor authority ------------------------------------------------

    /// Grant executor status. Only the notary may call this. Re-authorizing
    /// an existing executor succeeds without emitting an event.
    pub fn authorize_executor(
        &mut self,
        executor: Identity,
        caller: &Identity,
    ) -> Result<(), VaultError> {
        logged("authorize_executor", self.authority.require_notary(caller))?;

        let now = self.clock.now();
        if self.authority.grant(executor.clone()) {
            tracing::info!(%executor, "executor authorized");
            self.emit(VaultEvent::ExecutorAuthorized { executor }, now);
        }
        Ok(())
    }

    /// Whether `identity` is an authorized executor.
    pub fn is_executor(&self, identity: &Identity) -> bool {
        self.authority.is_executor(identity)
    }

    /// The notary.
    pub fn notary(&self) -> &Identity {
        self.authority.notary()
    }

    // -- Execution ---------------------------------------------------------

    /// Evaluate every release condition and, if all are met, authorize the
    /// distribution and deactivate the vault.
    ///
    /// A vault with no instructions executes with an empty distribution.
    ///
    /// # Errors
    ///
    /// - [`VaultError::UnauthorizedExecutor`] if `caller` is not an executor.
    /// - [`VaultError::VaultNotFound`] / [`VaultError::VaultInactive`].
    /// - [`VaultError::ConditionNotMet`] naming the first unmet instruction.
    pub fn execute_inheritance(
        &mut self,
        vault_id: VaultId,
        caller: &Identity,
    ) -> Result<ExecutionReceipt, VaultError> {
        let now = self.clock.now();
        let entitlements = logged(
            "execute_inheritance",
            self.prepare_execution(vault_id, caller, now),
        )?;

        self.registry.deactivate(vault_id, now);
        self.distributions.record(vault_id, entitlements.clone());
        tracing::info!(
            %vault_id,
            executor = %caller,
            beneficiaries = entitlements.len(),
            "inheritance executed"
        );
        self.emit(
            VaultEvent::InheritanceExecuted {
                vault_id,
                executor: caller.clone(),
                beneficiaries: entitlements.len(),
            },
            now,
        );
        Ok(ExecutionReceipt {
            vault_id,
            executor: caller.clone(),
            executed_at: now,
            entitlements,
        })
    }

    fn prepare_execution(
        &self,
        vault_id: VaultId,
        caller: &Identity,
        now: Timestamp,
    ) -> Result<Vec<Entitlement>, VaultError> {
        self.authority.require_executor(caller)?;
        let vault = self.registry.require(vault_id)?;
        if !vault.active {
            return Err(VaultError::VaultInactive { vault_id });
        }

        let instructions = self.ledger.instructions(vault_id);
        for (index, instruction) in instructions.iter().enumerate() {
            let kind = instruction.condition_kind;
            let evaluator = self
                .evaluators
                .get(kind)
                .ok_or(VaultError::UnsupportedCondition { kind })?;
            tracing::debug!(%vault_id, index, %kind, "evaluating release condition");
            let met = evaluator.evaluate(&self.fhe, &instruction.encrypted_release_condition, now)?;
            if !self.fhe.reveal_bool(&met)? {
                return Err(VaultError::ConditionNotMet { vault_id, index });
            }
        }

        let asset = self
            .assets
            .get(vault_id)
            .ok_or(VaultError::VaultNotFound { vault_id })?;
        Ok(compute_entitlements(
            &self.fhe,
            &asset.encrypted_value,
            instructions,
        )?)
    }

    /// Entitlements recorded when the vault was executed.
    pub fn get_distribution(&self, vault_id: VaultId) -> &[Entitlement] {
        self.distributions.get(vault_id)
    }

    // -- Reveal protocol ---------------------------------------------------

    /// Ask the oracle to decrypt the vault's three asset fields.
    ///
    /// Permitted whether or not the vault is still active. Several requests
    /// may be outstanding; the first verified response wins.
    pub fn request_asset_decryption(
        &mut self,
        vault_id: VaultId,
        caller: &Identity,
    ) -> Result<RequestId, VaultError> {
        let handles = logged(
            "request_asset_decryption",
            self.prepare_reveal_request(vault_id, caller),
        )?;
        let request_id = logged(
            "request_asset_decryption",
            self.oracle
                .request_decryption(&handles, CallbackSelector::RevealAsset)
                .map_err(VaultError::from),
        )?;

        let now = self.clock.now();
        self.bridge.record(PendingDecryption {
            request_id,
            vault_id,
            handles: handles.to_vec(),
            requested_at: now,
        });
        tracing::info!(%vault_id, %request_id, "asset decryption requested");
        self.emit(
            VaultEvent::DecryptionRequested {
                vault_id,
                request_id,
            },
            now,
        );
        Ok(request_id)
    }

    fn prepare_reveal_request(
        &self,
        vault_id: VaultId,
        caller: &Identity,
    ) -> Result<[CiphertextHandle; ASSET_FIELDS], VaultError> {
        self.registry.require_owner(vault_id, caller)?;
        if self.assets.is_revealed(vault_id) {
            return Err(VaultError::AlreadyRevealed { vault_id });
        }
        let asset = self
            .assets
            .get(vault_id)
            .ok_or(VaultError::VaultNotFound { vault_id })?;
        Ok(asset.handles())
    }

    /// Deliver an oracle response.
    ///
    /// Verifies `proof` over the handles recorded at request time, decodes
    /// the three words, stores the plaintext asset and consumes the pending
    /// request. Returns the revealed vault.
    pub fn on_decryption_callback(
        &mut self,
        request_id: RequestId,
        payload: &CleartextPayload,
        proof: &DecryptionProof,
    ) -> Result<VaultId, VaultError> {
        let (vault_id, words) = logged(
            "on_decryption_callback",
            self.verify_reveal(request_id, payload, proof),
        )?;

        let now = self.clock.now();
        self.assets.reveal(vault_id, words, now);
        self.bridge.consume(request_id);
        tracing::info!(%vault_id, %request_id, "asset revealed");
        self.emit(
            VaultEvent::AssetRevealed {
                vault_id,
                request_id,
            },
            now,
        );
        Ok(vault_id)
    }

    fn verify_reveal(
        &self,
        request_id: RequestId,
        payload: &CleartextPayload,
        proof: &DecryptionProof,
    ) -> Result<(VaultId, [u64; ASSET_FIELDS]), VaultError> {
        let pending = self.bridge.require(request_id)?;
        let vault_id = pending.vault_id;
        if self.assets.is_revealed(vault_id) {
            return Err(VaultError::AlreadyRevealed { vault_id });
        }
        if !self
            .oracle
            .verify_decryption(request_id, &pending.handles, payload, proof)?
        {
            return Err(VaultError::ProofVerificationFailed { request_id });
        }
        let words = payload
            .decode_words(ASSET_FIELDS)
            .map_err(|e| VaultError::MalformedPayload {
                request_id,
                reason: e.to_string(),
            })?;
        let fields: [u64; ASSET_FIELDS] =
            words
                .try_into()
                .map_err(|w: Vec<u64>| VaultError::MalformedPayload {
                    request_id,
                    reason: format!("expected {ASSET_FIELDS} words, got {}", w.len()),
                })?;
        Ok((vault_id, fields))
    }

    /// Outstanding reveal requests, oldest first.
    pub fn pending_requests(&self) -> Vec<&PendingDecryption> {
        self.bridge.pending().collect()
    }

    // -- Snapshot ----------------------------------------------------------

    /// A comparable copy of the complete vault state.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            next_vault_id: self.registry.next_id(),
            notary: self.authority.notary().clone(),
            executors: self.authority.executors().cloned().collect(),
            vaults: self.registry.iter().cloned().collect(),
            owner_index: self.registry.owner_index().clone(),
            assets: self.assets.iter().cloned().collect(),
            revealed: self.assets.iter_revealed().cloned().collect(),
            instructions: self
                .ledger
                .iter()
                .map(|(id, list)| (*id, list.clone()))
                .collect(),
            distributions: self
                .distributions
                .iter()
                .map(|(id, list)| (*id, list.clone()))
                .collect(),
            pending: self.bridge.pending().cloned().collect(),
        }
    }
}

impl<E, O> std::fmt::Debug for InheritanceEngine<E, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InheritanceEngine")
            .field("notary", self.authority.notary())
            .field("vaults", &self.registry.len())
            .field("pending", &self.bridge.len())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
