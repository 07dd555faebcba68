//! # Demo Subcommand
//!
//! Runs the bundled inheritance scenario: one vault worth 2000, a single
//! 60% instruction whose time lock has passed, execution by an authorized
//! executor, and a reveal that survives one forged oracle response. Prints
//! the event log as JSON.

use anyhow::{Context, Result};
use clap::Args;

use estate_vault::VaultConfig;

use crate::scenario::{run_scenario, Scenario, ScenarioReport};

/// The bundled scenario.
pub const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.yaml");

/// Arguments for `estate demo`.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Print the full report (steps, snapshot, events) instead of events only.
    #[arg(long)]
    pub full: bool,
}

/// Run the bundled scenario.
pub fn demo_report(config_override: Option<VaultConfig>) -> Result<ScenarioReport> {
    let scenario = Scenario::parse(DEMO_SCENARIO).context("bundled demo scenario is invalid")?;
    run_scenario(&scenario, config_override)
}

/// Execute `estate demo`.
pub fn run_demo(args: &DemoArgs, config_override: Option<VaultConfig>) -> Result<u8> {
    let report = demo_report(config_override)?;
    let json = if args.full {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.events)?
    };
    println!("{json}");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_vault::VaultEvent;

    #[test]
    fn demo_distributes_1200() {
        let report = demo_report(None).unwrap();
        let execute = report
            .steps
            .iter()
            .find(|s| s.action == "execute" && s.result == "ok")
            .unwrap();
        let amount = &execute.output.as_ref().unwrap()["entitlements"][0]["amount"];
        assert_eq!(amount, 1200);
    }

    #[test]
    fn demo_reveals_asset() {
        let report = demo_report(None).unwrap();
        let revealed = &report.snapshot.revealed[0];
        assert_eq!(
            (revealed.asset_type, revealed.asset_value, revealed.access_key),
            (1, 2000, 42)
        );
        assert!(report.snapshot.pending.is_empty());
    }

    #[test]
    fn demo_event_sequence() {
        let report = demo_report(None).unwrap();
        let kinds: Vec<&str> = report.events.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "vault_created",
                "asset_updated",
                "instruction_added",
                "executor_authorized",
                "inheritance_executed",
                "decryption_requested",
                "asset_revealed",
            ]
        );
        assert!(matches!(
            report.events.last().map(|r| &r.event),
            Some(VaultEvent::AssetRevealed { .. })
        ));
    }
}
