#![deny(missing_docs)]

//! # estate-vault: Encrypted Inheritance Vaults
//!
//! A vault holds one encrypted asset record and an ordered list of
//! encrypted inheritance instructions for a single owner. An authorized
//! executor triggers execution, which evaluates every release condition
//! homomorphically and, only if all are met, authorizes an encrypted
//! distribution and deactivates the vault. Separately, the owner may have
//! the asset revealed through an asynchronous decryption oracle whose
//! responses carry a verifiable proof.
//!
//! ## Modules
//!
//! | Module | Concern |
//! |--------|---------|
//! | [`registry`] | Vault ids, ownership, lifecycle flag |
//! | [`asset`] | Encrypted and revealed asset records |
//! | [`instruction`] | Instruction ledger and share check |
//! | [`authority`] | Notary and executor set |
//! | [`condition`] | Release-condition kinds, evaluators, clocks |
//! | [`distribution`] | Entitlement computation and ledger |
//! | [`oracle_bridge`] | Pending reveal requests |
//! | [`events`] | Bounded event log |
//! | [`engine`] | The transactional facade |
//!
//! ## Crate Policy
//!
//! - All state lives behind [`InheritanceEngine`]; components expose
//!   read access publicly and mutation only to the engine.
//! - No plaintext of a private value appears in logs, events or errors.

pub mod asset;
pub mod authority;
pub mod condition;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod events;
pub mod instruction;
pub mod oracle_bridge;
pub mod registry;

pub use asset::{AssetView, EncryptedAsset, RevealedAsset};
pub use condition::{
    Clock, ConditionEvaluator, ConditionKind, FixedClock, SystemClock, TimeLockEvaluator,
};
pub use config::{ConfigError, VaultConfig};
pub use distribution::Entitlement;
pub use engine::{ExecutionReceipt, InheritanceEngine, VaultSnapshot};
pub use error::{ErrorCategory, VaultError};
pub use events::{EventLog, EventRecord, VaultEvent};
pub use instruction::{InheritanceInstruction, SHARE_DENOMINATOR};
pub use oracle_bridge::PendingDecryption;
pub use registry::Vault;
