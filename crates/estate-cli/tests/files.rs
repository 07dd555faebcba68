//! File-based loading of configurations and scenarios.

use std::io::Write;

use estate_cli::config::load_config;
use estate_cli::demo::DEMO_SCENARIO;
use estate_cli::scenario::{run_scenario, Scenario};

fn write_temp(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(
        &dir,
        "estate.yaml",
        "notary: registrar\nmax_instructions: 4\nevent_log_capacity: 50\n",
    );
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.notary.as_str(), "registrar");
    assert_eq!(cfg.max_instructions, Some(4));
    assert_eq!(cfg.event_log_capacity, 50);
}

#[test]
fn config_file_with_unknown_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "estate.yaml", "notary: n\noracle_url: x\n");
    assert!(load_config(&path).is_err());
}

#[test]
fn scenario_file_runs_with_config_override() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = write_temp(
        &dir,
        "scenario.yaml",
        r#"
start_time: "2026-01-01T00:00:00Z"
steps:
  - action: create_vault
    owner: alice
  - action: authorize_executor
    executor: exec
    caller: notary
    expect_error: NOT_NOTARY
  - action: authorize_executor
    executor: exec
    caller: registrar
"#,
    );
    let config = write_temp(&dir, "estate.yaml", "notary: registrar\n");

    let scenario = Scenario::load(&scenario).unwrap();
    let report = run_scenario(&scenario, Some(load_config(&config).unwrap())).unwrap();
    assert_eq!(report.snapshot.notary.as_str(), "registrar");
    assert_eq!(report.snapshot.executors.len(), 1);
}

#[test]
fn instruction_limit_from_config_applies() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_temp(&dir, "estate.yaml", "notary: notary\nmax_instructions: 1\n");
    let scenario = Scenario::parse(
        r#"
steps:
  - action: create_vault
    owner: alice
  - action: add_instruction
    vault: 1
    caller: alice
    beneficiary: 1
    share: 50
    release_at: "2020-01-01T00:00:00Z"
  - action: add_instruction
    vault: 1
    caller: alice
    beneficiary: 2
    share: 50
    release_at: "2020-01-01T00:00:00Z"
    expect_error: INSTRUCTION_LIMIT_REACHED
"#,
    )
    .unwrap();
    let report = run_scenario(&scenario, Some(load_config(&config).unwrap())).unwrap();
    assert_eq!(report.steps[2].result, "INSTRUCTION_LIMIT_REACHED");
}

#[test]
fn bundled_demo_parses_from_disk_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_temp(&dir, "demo.yaml", DEMO_SCENARIO);
    let scenario = Scenario::load(&path).unwrap();
    assert_eq!(scenario.steps.len(), 10);
    assert!(run_scenario(&scenario, None).is_ok());
}

#[test]
fn missing_scenario_file_names_path() {
    let dir = tempfile::tempdir().unwrap();
    let err = Scenario::load(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(format!("{err:#}").contains("nope.yaml"));
}
