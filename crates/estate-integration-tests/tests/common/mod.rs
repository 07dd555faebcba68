//! Shared fixture: a vault engine over the reference engine with a settable
//! clock.

#![allow(dead_code)]

use std::sync::Arc;

use estate_core::{Identity, Timestamp, VaultId};
use estate_fhe::{ClearEngine, ClearOracle, OracleKeyPair};
use estate_vault::{FixedClock, InheritanceEngine, VaultConfig};

pub const NOW: u64 = 1_780_000_000;

pub type Vaults = InheritanceEngine<ClearEngine, ClearOracle>;

pub struct Harness {
    pub vaults: Vaults,
    pub fhe: ClearEngine,
    pub clock: Arc<FixedClock>,
}

pub fn id(s: &str) -> Identity {
    Identity::new(s).unwrap()
}

pub fn harness() -> Harness {
    harness_with(VaultConfig::new(id("notary")))
}

pub fn harness_with(config: VaultConfig) -> Harness {
    let fhe = ClearEngine::new();
    let oracle = ClearOracle::new(&fhe, OracleKeyPair::from_seed(&[42; 32]));
    let clock = Arc::new(FixedClock::new(Timestamp::from_unix_secs(NOW).unwrap()));
    let vaults = InheritanceEngine::new(config, fhe.clone(), oracle)
        .unwrap()
        .with_clock(Arc::clone(&clock));
    Harness { vaults, fhe, clock }
}

impl Harness {
    pub fn vault_with_asset(&mut self, owner: &str, asset_type: u64, value: u64, key: u64) -> VaultId {
        let owner = id(owner);
        let v = self.vaults.create_vault(owner.clone()).unwrap();
        let (t, val, k) = (
            self.fhe.encrypt(asset_type),
            self.fhe.encrypt(value),
            self.fhe.encrypt(key),
        );
        self.vaults.set_asset(v, t, val, k, &owner).unwrap();
        v
    }

    pub fn add(&mut self, v: VaultId, owner: &str, beneficiary: u64, share: u64, unlock_at: u64) -> usize {
        let (b, s, c) = (
            self.fhe.encrypt(beneficiary),
            self.fhe.encrypt(share),
            self.fhe.encrypt(unlock_at),
        );
        self.vaults.add_instruction(v, b, s, c, &id(owner)).unwrap()
    }

    pub fn authorize(&mut self, executor: &str) -> Identity {
        let exec = id(executor);
        self.vaults
            .authorize_executor(exec.clone(), &id("notary"))
            .unwrap();
        exec
    }

    pub fn advance_to(&self, secs: u64) {
        self.clock.set(Timestamp::from_unix_secs(secs).unwrap());
    }
}
