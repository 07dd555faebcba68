//! # Vault Configuration
//!
//! Deployment-time settings for an inheritance engine. Parsing from files is
//! the caller's concern; this module owns the shape and its validation.

use estate_core::Identity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::DEFAULT_EVENT_LOG_CAPACITY;

/// Invalid configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_instructions` was set to zero.
    #[error("max_instructions must be at least 1 when set")]
    ZeroInstructionLimit,

    /// `event_log_capacity` was set to zero.
    #[error("event_log_capacity must be at least 1")]
    ZeroEventLogCapacity,
}

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// The identity allowed to authorize executors. Fixed for the lifetime
    /// of the engine.
    pub notary: Identity,
    /// Upper bound on instructions per vault. Unbounded when absent.
    #[serde(default)]
    pub max_instructions: Option<usize>,
    /// Number of event records retained before trimming.
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl VaultConfig {
    /// Configuration with defaults for everything but the notary.
    pub fn new(notary: Identity) -> Self {
        Self {
            notary,
            max_instructions: None,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }

    /// Bound the number of instructions per vault.
    pub fn with_max_instructions(mut self, max: usize) -> Self {
        self.max_instructions = Some(max);
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_instructions == Some(0) {
            return Err(ConfigError::ZeroInstructionLimit);
        }
        if self.event_log_capacity == 0 {
            return Err(ConfigError::ZeroEventLogCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_json() {
        let cfg: VaultConfig = serde_json::from_str(r#"{"notary": "notary"}"#).unwrap();
        assert_eq!(cfg.notary.as_str(), "notary");
        assert_eq!(cfg.max_instructions, None);
        assert_eq!(cfg.event_log_capacity, DEFAULT_EVENT_LOG_CAPACITY);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_fields() {
        let res: Result<VaultConfig, _> =
            serde_json::from_str(r#"{"notary": "n", "oracle": "x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_invalid_notary() {
        let res: Result<VaultConfig, _> = serde_json::from_str(r#"{"notary": ""}"#);
        assert!(res.is_err());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let notary = Identity::new("n").unwrap();
        assert_eq!(
            VaultConfig::new(notary.clone()).with_max_instructions(0).validate(),
            Err(ConfigError::ZeroInstructionLimit)
        );
        let mut cfg = VaultConfig::new(notary);
        cfg.event_log_capacity = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroEventLogCapacity));
    }
}
