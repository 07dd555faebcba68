//! # Scenario Runner
//!
//! Replays a YAML list of vault operations against the transparent
//! reference engine, with a settable clock and a fixed oracle key, so a run
//! is fully deterministic.
//!
//! ```yaml
//! start_time: "2026-01-01T00:00:00Z"
//! steps:
//!   - action: create_vault
//!     owner: alice
//!   - action: set_asset
//!     vault: 1
//!     caller: alice
//!     asset_type: 1
//!     value: 2000
//!     access_key: 42
//!   - action: execute
//!     vault: 1
//!     caller: mallory
//!     expect_error: UNAUTHORIZED_EXECUTOR
//! ```
//!
//! Vaults and decryption requests are referenced by their numeric ids,
//! which both start at 1. A failing step aborts the run unless its
//! `expect_error` names the failure's stable code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

use estate_core::{Identity, RequestId, Timestamp, VaultId};
use estate_fhe::{ClearEngine, ClearOracle, CleartextPayload, DecryptionResponse, OracleKeyPair};
use estate_vault::{EventRecord, FixedClock, InheritanceEngine, VaultConfig, VaultError, VaultSnapshot};

/// Seed of the scenario oracle key unless a scenario overrides it.
pub const DEFAULT_ORACLE_SEED: u8 = 7;

/// Arguments for `estate run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML scenario.
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    /// Print only the event log instead of the full report.
    #[arg(long)]
    pub events_only: bool,
}

// ---------------------------------------------------------------------------
// Scenario document
// ---------------------------------------------------------------------------

/// A scenario document.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Engine configuration. Overridden by `--config`; defaults to a notary
    /// named `notary`.
    #[serde(default)]
    pub config: Option<VaultConfig>,
    /// Initial clock value. Defaults to the wall clock at load time.
    #[serde(default)]
    pub start_time: Option<Timestamp>,
    /// Seed byte of the oracle signing key.
    #[serde(default)]
    pub oracle_seed: Option<u8>,
    /// Operations, in order.
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Parse a scenario document.
    pub fn parse(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("scenario is not valid YAML")
    }

    /// Load a scenario file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario: {}", path.display()))
    }
}

/// One step with its expected outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioStep {
    /// The operation.
    #[serde(flatten)]
    pub action: Action,
    /// Stable error code the step is expected to fail with.
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// Scenario operations. Plain integers are encrypted client-side before
/// being handed to the vault.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Create a vault.
    CreateVault {
        /// Owner identity.
        owner: Identity,
    },
    /// Replace a vault's asset fields.
    SetAsset {
        /// Target vault id.
        vault: VaultId,
        /// Caller identity.
        caller: Identity,
        /// Asset category code.
        asset_type: u64,
        /// Asset value.
        value: u64,
        /// Access credential.
        access_key: u64,
    },
    /// Append a time-locked instruction.
    AddInstruction {
        /// Target vault id.
        vault: VaultId,
        /// Caller identity.
        caller: Identity,
        /// Beneficiary identity code.
        beneficiary: u64,
        /// Percentage share.
        share: u64,
        /// Time after which the instruction releases.
        release_at: Timestamp,
    },
    /// Replace an instruction's release time.
    UpdateCondition {
        /// Target vault id.
        vault: VaultId,
        /// Caller identity.
        caller: Identity,
        /// Instruction index.
        index: usize,
        /// New release time.
        release_at: Timestamp,
    },
    /// Grant executor status.
    AuthorizeExecutor {
        /// New executor.
        executor: Identity,
        /// Caller identity.
        caller: Identity,
    },
    /// Move the scenario clock.
    SetTime {
        /// New clock value.
        time: Timestamp,
    },
    /// Execute a vault.
    Execute {
        /// Target vault id.
        vault: VaultId,
        /// Caller identity.
        caller: Identity,
    },
    /// Ask the oracle to reveal a vault's asset.
    RequestDecryption {
        /// Target vault id.
        vault: VaultId,
        /// Caller identity.
        caller: Identity,
    },
    /// Fulfill a request and deliver the genuine response.
    FulfillDecryption {
        /// Request id.
        request: RequestId,
    },
    /// Fulfill a request and deliver a response with a forged payload.
    TamperDecryption {
        /// Request id.
        request: RequestId,
    },
}

impl Action {
    /// Step name as written in the scenario.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateVault { .. } => "create_vault",
            Self::SetAsset { .. } => "set_asset",
            Self::AddInstruction { .. } => "add_instruction",
            Self::UpdateCondition { .. } => "update_condition",
            Self::AuthorizeExecutor { .. } => "authorize_executor",
            Self::SetTime { .. } => "set_time",
            Self::Execute { .. } => "execute",
            Self::RequestDecryption { .. } => "request_decryption",
            Self::FulfillDecryption { .. } => "fulfill_decryption",
            Self::TamperDecryption { .. } => "tamper_decryption",
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened at one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Position in the scenario, from 0.
    pub step: usize,
    /// Step name.
    pub action: &'static str,
    /// `"ok"` or the stable error code.
    pub result: String,
    /// Step output, when there is any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Per-step outcomes.
    pub steps: Vec<StepOutcome>,
    /// Final vault state.
    pub snapshot: VaultSnapshot,
    /// Event log.
    pub events: Vec<EventRecord>,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Drives an engine through scenario steps.
pub struct ScenarioRunner {
    vault: InheritanceEngine<ClearEngine, ClearOracle>,
    fhe: ClearEngine,
    clock: Arc<FixedClock>,
    held: BTreeMap<RequestId, DecryptionResponse>,
}

impl ScenarioRunner {
    /// Build a runner for `scenario`, with `config_override` taking
    /// precedence over the scenario's own configuration.
    pub fn new(scenario: &Scenario, config_override: Option<VaultConfig>) -> Result<Self> {
        let config = match config_override.or_else(|| scenario.config.clone()) {
            Some(config) => config,
            None => VaultConfig::new(Identity::new("notary")?),
        };
        let start = scenario.start_time.unwrap_or_else(Timestamp::now);
        let seed = scenario.oracle_seed.unwrap_or(DEFAULT_ORACLE_SEED);

        let fhe = ClearEngine::new();
        let oracle = ClearOracle::new(&fhe, OracleKeyPair::from_seed(&[seed; 32]));
        let clock = Arc::new(FixedClock::new(start));
        let vault = InheritanceEngine::new(config, fhe.clone(), oracle)
            .context("scenario configuration rejected")?
            .with_clock(Arc::clone(&clock));
        Ok(Self {
            vault,
            fhe,
            clock,
            held: BTreeMap::new(),
        })
    }

    /// The engine under test.
    pub fn vault(&self) -> &InheritanceEngine<ClearEngine, ClearOracle> {
        &self.vault
    }

    /// The client-side engine, for decrypting results.
    pub fn fhe(&self) -> &ClearEngine {
        &self.fhe
    }

    /// Run every step in order.
    pub fn run(&mut self, steps: &[ScenarioStep]) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            let action = step.action.name();
            tracing::debug!(step = i, action, "running step");
            let result = self.apply(&step.action);
            let outcome = match (result, &step.expect_error) {
                (Ok(output), None) => StepOutcome {
                    step: i,
                    action,
                    result: "ok".to_string(),
                    output,
                },
                (Ok(_), Some(expected)) => {
                    bail!("step {i} ({action}) succeeded but was expected to fail with {expected}")
                }
                (Err(e), Some(expected)) if e.code() == expected.as_str() => StepOutcome {
                    step: i,
                    action,
                    result: e.code().to_string(),
                    output: None,
                },
                (Err(e), _) => bail!("step {i} ({action}) failed with {}: {e}", e.code()),
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Produce the final report.
    pub fn report(&self, steps: Vec<StepOutcome>) -> ScenarioReport {
        ScenarioReport {
            steps,
            snapshot: self.vault.snapshot(),
            events: self.vault.events().records().to_vec(),
        }
    }

    fn apply(&mut self, action: &Action) -> Result<Option<serde_json::Value>, VaultError> {
        match action {
            Action::CreateVault { owner } => {
                let id = self.vault.create_vault(owner.clone())?;
                Ok(Some(serde_json::json!({ "vault_id": id })))
            }
            Action::SetAsset {
                vault,
                caller,
                asset_type,
                value,
                access_key,
            } => {
                let vault_id = *vault;
                let (t, v, k) = (
                    self.fhe.encrypt(*asset_type),
                    self.fhe.encrypt(*value),
                    self.fhe.encrypt(*access_key),
                );
                self.vault.set_asset(vault_id, t, v, k, caller)?;
                Ok(None)
            }
            Action::AddInstruction {
                vault,
                caller,
                beneficiary,
                share,
                release_at,
            } => {
                let vault_id = *vault;
                let (b, s, c) = (
                    self.fhe.encrypt(*beneficiary),
                    self.fhe.encrypt(*share),
                    self.fhe.encrypt(release_at.unix_secs()),
                );
                let index = self.vault.add_instruction(vault_id, b, s, c, caller)?;
                Ok(Some(serde_json::json!({ "index": index })))
            }
            Action::UpdateCondition {
                vault,
                caller,
                index,
                release_at,
            } => {
                let vault_id = *vault;
                let c = self.fhe.encrypt(release_at.unix_secs());
                self.vault.update_condition(vault_id, *index, c, caller)?;
                Ok(None)
            }
            Action::AuthorizeExecutor { executor, caller } => {
                self.vault.authorize_executor(executor.clone(), caller)?;
                Ok(None)
            }
            Action::SetTime { time } => {
                self.clock.set(*time);
                Ok(None)
            }
            Action::Execute { vault, caller } => {
                let receipt = self.vault.execute_inheritance(*vault, caller)?;
                let amounts = receipt
                    .entitlements
                    .iter()
                    .map(|e| -> Result<serde_json::Value, VaultError> {
                        Ok(serde_json::json!({
                            "index": e.index,
                            "beneficiary": self.fhe.decrypt(&e.encrypted_beneficiary)?,
                            "amount": self.fhe.decrypt(&e.encrypted_share_value)?,
                        }))
                    })
                    .collect::<Result<Vec<_>, VaultError>>()?;
                Ok(Some(serde_json::json!({ "entitlements": amounts })))
            }
            Action::RequestDecryption { vault, caller } => {
                let request_id = self
                    .vault
                    .request_asset_decryption(*vault, caller)?;
                Ok(Some(serde_json::json!({ "request_id": request_id })))
            }
            Action::FulfillDecryption { request } => {
                let response = self.response_for(*request)?;
                let vault_id = self.vault.on_decryption_callback(
                    response.request_id,
                    &response.payload,
                    &response.proof,
                )?;
                Ok(Some(serde_json::json!({ "vault_id": vault_id })))
            }
            Action::TamperDecryption { request } => {
                let response = self.response_for(*request)?;
                let forged = forge_payload(&response.payload);
                let vault_id =
                    self.vault
                        .on_decryption_callback(response.request_id, &forged, &response.proof)?;
                Ok(Some(serde_json::json!({ "vault_id": vault_id })))
            }
        }
    }

    /// The oracle's response for `request_id`, fulfilling it on first use.
    fn response_for(&mut self, request_id: RequestId) -> Result<DecryptionResponse, VaultError> {
        if let Some(response) = self.held.get(&request_id) {
            return Ok(response.clone());
        }
        let response = self.vault.oracle().fulfill(request_id)?;
        self.held.insert(request_id, response.clone());
        Ok(response)
    }
}

/// Flip the lowest bit of the payload's last byte.
fn forge_payload(payload: &CleartextPayload) -> CleartextPayload {
    let mut bytes = payload.as_bytes().to_vec();
    if let Some(last) = bytes.last_mut() {
        *last ^= 1;
    }
    CleartextPayload::from_bytes(bytes)
}

/// Parse, run and report a scenario.
pub fn run_scenario(scenario: &Scenario, config_override: Option<VaultConfig>) -> Result<ScenarioReport> {
    let mut runner = ScenarioRunner::new(scenario, config_override)?;
    let steps = runner.run(&scenario.steps)?;
    Ok(runner.report(steps))
}

/// Execute `estate run`.
pub fn run_run(args: &RunArgs, config_override: Option<VaultConfig>) -> Result<u8> {
    let scenario = Scenario::load(&args.scenario)?;
    let report = run_scenario(&scenario, config_override)
        .with_context(|| format!("scenario failed: {}", args.scenario.display()))?;
    let json = if args.events_only {
        serde_json::to_string_pretty(&report.events)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
start_time: "2026-01-01T00:00:00Z"
steps:
  - action: create_vault
    owner: alice
  - action: set_asset
    vault: 1
    caller: alice
    asset_type: 1
    value: 2000
    access_key: 42
  - action: add_instruction
    vault: 1
    caller: alice
    beneficiary: 1001
    share: 60
    release_at: "2025-06-01T00:00:00Z"
  - action: update_condition
    vault: 1
    caller: alice
    index: 5
    release_at: "2025-06-01T00:00:00Z"
    expect_error: INDEX_OUT_OF_RANGE
  - action: authorize_executor
    executor: exec
    caller: notary
  - action: execute
    vault: 1
    caller: exec
"#;

    #[test]
    fn basic_scenario_runs() {
        let scenario = Scenario::parse(BASIC).unwrap();
        let report = run_scenario(&scenario, None).unwrap();
        assert_eq!(report.steps.len(), 6);
        assert_eq!(report.steps[3].result, "INDEX_OUT_OF_RANGE");
        let out = report.steps[5].output.as_ref().unwrap();
        assert_eq!(out["entitlements"][0]["amount"], 1200);
        assert_eq!(out["entitlements"][0]["beneficiary"], 1001);
        assert!(!report.snapshot.vaults[0].active);
    }

    #[test]
    fn unexpected_failure_aborts() {
        let text = r#"
steps:
  - action: create_vault
    owner: alice
  - action: set_asset
    vault: 1
    caller: mallory
    asset_type: 1
    value: 1
    access_key: 1
"#;
        let scenario = Scenario::parse(text).unwrap();
        let err = run_scenario(&scenario, None).unwrap_err();
        assert!(format!("{err}").contains("NOT_OWNER"));
    }

    #[test]
    fn unexpected_success_aborts() {
        let text = r#"
steps:
  - action: create_vault
    owner: alice
    expect_error: NOT_OWNER
"#;
        let scenario = Scenario::parse(text).unwrap();
        assert!(run_scenario(&scenario, None).is_err());
    }

    #[test]
    fn tamper_then_fulfill() {
        let text = r#"
steps:
  - action: create_vault
    owner: alice
  - action: request_decryption
    vault: 1
    caller: alice
  - action: tamper_decryption
    request: 1
    expect_error: PROOF_VERIFICATION_FAILED
  - action: fulfill_decryption
    request: 1
  - action: request_decryption
    vault: 1
    caller: alice
    expect_error: ALREADY_REVEALED
"#;
        let scenario = Scenario::parse(text).unwrap();
        let report = run_scenario(&scenario, None).unwrap();
        assert_eq!(report.snapshot.revealed.len(), 1);
        assert_eq!(report.snapshot.revealed[0].asset_value, 0);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Scenario::parse("steps:\n  - action: delete_vault\n    vault: 1\n").is_err());
    }

    #[test]
    fn forge_changes_payload() {
        let p = CleartextPayload::encode_words(&[1, 2, 3]);
        assert_ne!(forge_payload(&p), p);
    }
}
