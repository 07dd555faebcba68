//! # estate-cli: CLI Tool for the Estate Vault Stack
//!
//! Provides the `estate` command-line interface.
//!
//! ## Subcommands
//!
//! - `estate demo`: Run the bundled inheritance scenario.
//! - `estate run`: Replay a YAML scenario against the reference engine.
//! - `estate check-config`: Validate a configuration file.
//!
//! ```bash
//! estate demo --full
//! estate --config estate.yaml run crates/estate-cli/scenarios/demo.yaml
//! estate check-config estate.yaml
//! ```
//!
//! All runs use the transparent reference engine. Nothing here provides
//! confidentiality.

pub mod config;
pub mod demo;
pub mod scenario;
