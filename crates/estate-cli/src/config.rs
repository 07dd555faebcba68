//! # Configuration Loading
//!
//! Reads a [`VaultConfig`] from YAML and validates it.
//!
//! ```yaml
//! notary: notary
//! max_instructions: 16        # optional, unbounded when absent
//! event_log_capacity: 10000   # optional
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use estate_vault::VaultConfig;

/// Arguments for `estate check-config`.
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Path to the YAML configuration file.
    #[arg(value_name = "FILE")]
    pub file: std::path::PathBuf,
}

/// Parse and validate a configuration document.
pub fn parse_config(text: &str) -> Result<VaultConfig> {
    let config: VaultConfig =
        serde_yaml::from_str(text).context("configuration is not valid YAML for VaultConfig")?;
    config.validate().context("configuration failed validation")?;
    Ok(config)
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<VaultConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration: {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid configuration: {}", path.display()))
}

/// Execute `estate check-config`.
pub fn run_check_config(args: &CheckConfigArgs) -> Result<u8> {
    let config = load_config(&args.file)?;
    println!("OK: {}", args.file.display());
    println!("  notary:             {}", config.notary);
    match config.max_instructions {
        Some(max) => println!("  max_instructions:   {max}"),
        None => println!("  max_instructions:   unbounded"),
    }
    println!("  event_log_capacity: {}", config.event_log_capacity);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config() {
        let cfg = parse_config("notary: notary\n").unwrap();
        assert_eq!(cfg.notary.as_str(), "notary");
        assert!(cfg.max_instructions.is_none());
    }

    #[test]
    fn rejects_zero_instruction_limit() {
        let err = parse_config("notary: notary\nmax_instructions: 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("max_instructions"));
    }

    #[test]
    fn rejects_missing_notary() {
        assert!(parse_config("max_instructions: 3\n").is_err());
    }

    #[test]
    fn load_config_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        let err = load_config(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("absent.yaml"));
    }
}
