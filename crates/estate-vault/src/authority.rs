//! # Executor Authority
//!
//! A single notary, fixed at construction, grants executor status. Grants
//! are monotonic: there is no revocation.

use std::collections::BTreeSet;

use estate_core::Identity;

use crate::error::VaultError;

/// The notary and the set of authorized executors.
#[derive(Debug, Clone)]
pub struct ExecutorAuthority {
    notary: Identity,
    executors: BTreeSet<Identity>,
}

impl ExecutorAuthority {
    /// No executors yet.
    pub fn new(notary: Identity) -> Self {
        Self {
            notary,
            executors: BTreeSet::new(),
        }
    }

    /// The notary.
    pub fn notary(&self) -> &Identity {
        &self.notary
    }

    /// Whether `identity` may execute vaults.
    pub fn is_executor(&self, identity: &Identity) -> bool {
        self.executors.contains(identity)
    }

    pub(crate) fn require_notary(&self, caller: &Identity) -> Result<(), VaultError> {
        if caller != &self.notary {
            return Err(VaultError::NotNotary {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    pub(crate) fn require_executor(&self, caller: &Identity) -> Result<(), VaultError> {
        if !self.is_executor(caller) {
            return Err(VaultError::UnauthorizedExecutor {
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Grant executor status. Returns `true` if newly granted.
    pub(crate) fn grant(&mut self, executor: Identity) -> bool {
        self.executors.insert(executor)
    }

    /// Authorized executors in identity order.
    pub fn executors(&self) -> impl Iterator<Item = &Identity> {
        self.executors.iter()
    }
}
