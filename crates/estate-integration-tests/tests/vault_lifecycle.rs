//! # Vault Lifecycle
//!
//! Creation, ownership checks, instruction management and all-or-nothing
//! execution across the registry, asset store, ledger and authority.

mod common;

use common::{harness, harness_with, id, NOW};
use estate_fhe::CiphertextArithmetic;
use estate_vault::{ErrorCategory, VaultConfig, VaultError, VaultEvent};

#[test]
fn sixty_percent_of_2000_is_1200() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 2000, 42);
    h.add(v, "alice", 1001, 60, NOW - 86_400);
    let exec = h.authorize("executor");

    let receipt = h.vaults.execute_inheritance(v, &exec).unwrap();
    assert_eq!(receipt.entitlements.len(), 1);
    let ent = &receipt.entitlements[0];
    assert_eq!(h.fhe.decrypt(&ent.encrypted_beneficiary).unwrap(), 1001);
    assert_eq!(h.fhe.decrypt(&ent.encrypted_share_value).unwrap(), 1200);

    let view = h.vaults.get_asset(v).unwrap();
    assert!(!view.active);
    assert_eq!(h.vaults.get_distribution(v).len(), 1);
}

#[test]
fn update_condition_past_end_is_out_of_range() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 100, 1);
    h.add(v, "alice", 1, 50, NOW);
    h.add(v, "alice", 2, 50, NOW);
    let before = h.vaults.snapshot();

    let c = h.fhe.encrypt(0);
    let err = h
        .vaults
        .update_condition(v, 5, c, &id("alice"))
        .unwrap_err();
    assert!(matches!(err, VaultError::IndexOutOfRange { index: 5, len: 2, .. }));
    assert_eq!(err.code(), "INDEX_OUT_OF_RANGE");
    assert_eq!(h.vaults.snapshot(), before);
}

#[test]
fn update_condition_unlocks_execution() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 100, 1);
    h.add(v, "alice", 1, 100, NOW + 1_000);
    let exec = h.authorize("executor");
    assert!(matches!(
        h.vaults.execute_inheritance(v, &exec),
        Err(VaultError::ConditionNotMet { index: 0, .. })
    ));

    let earlier = h.fhe.encrypt(NOW - 1);
    h.vaults
        .update_condition(v, 0, earlier, &id("alice"))
        .unwrap();
    h.vaults.execute_inheritance(v, &exec).unwrap();
}

#[test]
fn non_owner_mutations_leave_state_unchanged() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 2000, 42);
    h.add(v, "alice", 1001, 60, NOW - 1);
    let before = h.vaults.snapshot();
    let events_before = h.vaults.events().len();
    let mallory = id("mallory");
    let x = h.fhe.encrypt(7);

    let errors = vec![
        h.vaults.set_asset(v, x, x, x, &mallory).unwrap_err(),
        h.vaults.add_instruction(v, x, x, x, &mallory).unwrap_err(),
        h.vaults.update_condition(v, 0, x, &mallory).unwrap_err(),
        h.vaults.request_asset_decryption(v, &mallory).unwrap_err(),
    ];
    for err in errors {
        assert!(matches!(err, VaultError::NotOwner { .. }), "{err}");
        assert_eq!(err.category(), ErrorCategory::Authorization);
    }
    assert_eq!(h.vaults.snapshot(), before);
    assert_eq!(h.vaults.events().len(), events_before);
}

#[test]
fn execution_is_all_or_nothing() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 1000, 1);
    h.add(v, "alice", 1, 25, NOW - 10);
    h.add(v, "alice", 2, 25, NOW - 10);
    h.add(v, "alice", 3, 50, NOW + 10);
    let exec = h.authorize("executor");
    let before = h.vaults.snapshot();

    let err = h.vaults.execute_inheritance(v, &exec).unwrap_err();
    assert!(matches!(err, VaultError::ConditionNotMet { index: 2, .. }));
    assert!(h.vaults.get_vault(v).unwrap().active);
    assert!(h.vaults.get_distribution(v).is_empty());
    assert_eq!(h.vaults.snapshot(), before);

    h.advance_to(NOW + 11);
    let receipt = h.vaults.execute_inheritance(v, &exec).unwrap();
    let amounts: Vec<u64> = receipt
        .entitlements
        .iter()
        .map(|e| h.fhe.decrypt(&e.encrypted_share_value).unwrap())
        .collect();
    assert_eq!(amounts, vec![250, 250, 500]);
}

#[test]
fn second_execution_fails_inactive() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 10, 1);
    let exec = h.authorize("executor");

    let first = h.vaults.execute_inheritance(v, &exec).unwrap();
    assert!(first.entitlements.is_empty());
    let after_first = h.vaults.snapshot();

    let err = h.vaults.execute_inheritance(v, &exec).unwrap_err();
    assert!(matches!(err, VaultError::VaultInactive { .. }));
    assert_eq!(h.vaults.snapshot(), after_first);

    let executed = h
        .vaults
        .events()
        .records()
        .iter()
        .filter(|r| matches!(r.event, VaultEvent::InheritanceExecuted { .. }))
        .count();
    assert_eq!(executed, 1);
}

#[test]
fn unauthorized_executor_checked_before_vault_state() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 10, 1);
    let err = h
        .vaults
        .execute_inheritance(v, &id("alice"))
        .unwrap_err();
    assert!(matches!(err, VaultError::UnauthorizedExecutor { .. }));

    let missing = estate_core::VaultId::new(99).unwrap();
    let err = h
        .vaults
        .execute_inheritance(missing, &id("alice"))
        .unwrap_err();
    assert!(matches!(err, VaultError::UnauthorizedExecutor { .. }));
}

#[test]
fn instructions_may_be_added_after_execution() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 10, 1);
    let exec = h.authorize("executor");
    h.vaults.execute_inheritance(v, &exec).unwrap();
    let index = h.add(v, "alice", 1, 100, NOW);
    assert_eq!(index, 0);
    assert!(h.vaults.get_distribution(v).is_empty());
}

#[test]
fn share_check_is_advisory() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 1000, 1);
    h.add(v, "alice", 1, 70, NOW - 1);
    h.add(v, "alice", 2, 70, NOW - 1);
    let bit = h.vaults.total_share_check(v).unwrap();
    assert!(!h.fhe.reveal_bool(&bit).unwrap());

    // Over-allocated plans still execute.
    let exec = h.authorize("executor");
    let receipt = h.vaults.execute_inheritance(v, &exec).unwrap();
    let total: u64 = receipt
        .entitlements
        .iter()
        .map(|e| h.fhe.decrypt(&e.encrypted_share_value).unwrap())
        .sum();
    assert_eq!(total, 1400);
}

#[test]
fn configured_instruction_limit() {
    let mut h = harness_with(VaultConfig::new(id("notary")).with_max_instructions(2));
    let v = h.vault_with_asset("alice", 1, 10, 1);
    h.add(v, "alice", 1, 50, NOW);
    h.add(v, "alice", 2, 50, NOW);
    let x = h.fhe.encrypt(1);
    let err = h
        .vaults
        .add_instruction(v, x, x, x, &id("alice"))
        .unwrap_err();
    assert_eq!(err.code(), "INSTRUCTION_LIMIT_REACHED");
}

#[test]
fn events_follow_commits() {
    let mut h = harness();
    let v = h.vault_with_asset("alice", 1, 10, 1);
    h.add(v, "alice", 1, 100, NOW - 1);
    let kinds: Vec<&str> = h
        .vaults
        .events()
        .for_vault(v)
        .iter()
        .map(|r| r.event.as_str())
        .collect();
    assert_eq!(kinds, vec!["vault_created", "asset_updated", "instruction_added"]);
    let sequences: Vec<u64> = h.vaults.events().records().iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
}
