//! CLI entrypoint module structure.
use anyhow::{Context, Result};

use crate::fastforward::{resolve_forward_args, Activation, RawParams};

pub mod args;
pub mod profile;

pub use args::{ActivationArgs, CliCommand, LaunchProfileArgs, ParsedCommand};
pub use profile::{build_launch_args, resolve_config_path, ConfigSource, LaunchProfile};

/// Execute CLI command mode and return the text to print on stdout.
pub fn execute_cli_command(command: CliCommand, activation: &Activation) -> Result<String> {
    match command {
        CliCommand::Render => {
            let args = resolve_forward_args(activation)?;
            Ok(args.into_string())
        }
        CliCommand::Schema => {
            let schema = schemars::schema_for!(RawParams);
            serde_json::to_string_pretty(&schema).context("failed to serialize parameter schema")
        }
    }
}
