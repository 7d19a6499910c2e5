//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{builder::BoolishValueParser, Args, Parser, Subcommand};

use crate::fastforward::{Activation, RawParams};

use super::{build_launch_args, resolve_config_path, LaunchProfile};

/// Parsed command intent from CLI.
#[derive(Debug, Clone)]
pub enum ParsedCommand {
    Launch {
        profile: LaunchProfile,
        activation: Activation,
    },
    Cli {
        command: CliCommand,
        activation: Activation,
    },
}

/// Optional utility commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Print the merged argument string without forwarding it.
    Render,
    /// Print the JSON Schema of the jsonData parameter file.
    Schema,
}

/// Replay parameters carried by the activation.
///
/// Booleans take an optional value after `=`: `--offscreen` means true,
/// `--removeUnusedShader=0` sets it explicitly.
#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Replay parameters")]
pub struct ActivationArgs {
    /// Trace input path.
    #[arg(long = "input", value_name = "PATH")]
    pub input: Option<String>,
    /// Trace output path.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<String>,
    /// Frame to fast-forward to.
    #[arg(
        long = "targetFrame",
        value_name = "FRAME",
        allow_negative_numbers = true
    )]
    pub target_frame: Option<i32>,
    /// Last frame to replay.
    #[arg(
        long = "endFrame",
        value_name = "FRAME",
        allow_negative_numbers = true
    )]
    pub end_frame: Option<i32>,
    #[arg(
        long = "multithread",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub multithread: Option<bool>,
    #[arg(
        long = "offscreen",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub offscreen: Option<bool>,
    #[arg(
        long = "noscreen",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub noscreen: Option<bool>,
    #[arg(
        long = "norestoretex",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub norestoretex: Option<bool>,
    /// Ask the replay program to print its version.
    #[arg(
        long = "version",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub version: Option<bool>,
    #[arg(
        long = "restorefbo0",
        value_name = "N",
        allow_negative_numbers = true
    )]
    pub restorefbo0: Option<i32>,
    #[arg(
        long = "removeUnusedShader",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_unused_shader: Option<bool>,
    #[arg(
        long = "removeUnusedMipmap",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_unused_mipmap: Option<bool>,
    #[arg(
        long = "removeUnusedBuffer",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_unused_buffer: Option<bool>,
    #[arg(
        long = "norestoreUnusedBuffer",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub norestore_unused_buffer: Option<bool>,
    #[arg(
        long = "removeBufferSubData",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_buffer_sub_data: Option<bool>,
    #[arg(
        long = "removeUnusedtex",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_unusedtex: Option<bool>,
    #[arg(
        long = "norestoreUnusedtex",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub norestore_unusedtex: Option<bool>,
    #[arg(
        long = "removeTexSubImage",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_tex_sub_image: Option<bool>,
    #[arg(
        long = "removeCopyImage",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_copy_image: Option<bool>,
    #[arg(
        long = "removeBufferMap",
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub remove_buffer_map: Option<bool>,
    /// JSON parameter file path, or inline JSON; activation flags take priority.
    #[arg(long = "jsonData", value_name = "PATH_OR_JSON")]
    pub json_data: Option<String>,
}

impl ActivationArgs {
    pub fn into_activation(self) -> Activation {
        let extras = RawParams {
            input: self.input,
            output: self.output,
            target_frame: self.target_frame,
            end_frame: self.end_frame,
            multithread: self.multithread,
            offscreen: self.offscreen,
            noscreen: self.noscreen,
            norestoretex: self.norestoretex,
            version: self.version,
            restorefbo0: self.restorefbo0,
            remove_unused_shader: self.remove_unused_shader,
            remove_unused_mipmap: self.remove_unused_mipmap,
            remove_unused_buffer: self.remove_unused_buffer,
            norestore_unused_buffer: self.norestore_unused_buffer,
            remove_buffer_sub_data: self.remove_buffer_sub_data,
            remove_unusedtex: self.remove_unusedtex,
            norestore_unusedtex: self.norestore_unusedtex,
            remove_tex_sub_image: self.remove_tex_sub_image,
            remove_copy_image: self.remove_copy_image,
            remove_buffer_map: self.remove_buffer_map,
        };
        Activation::new(extras, self.json_data)
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "paretrace-fastforward",
    author,
    about = "Merge replay parameters and forward them to the paretrace replay program",
    long_about = None,
    disable_version_flag = true
)]
pub struct LaunchProfileArgs {
    /// Path to the launcher config (overrides PARETRACE_FASTFORWARD_CONFIG).
    #[arg(long = "config")]
    pub config_override: Option<PathBuf>,
    /// Print the forward request as JSON instead of launching the replay program.
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,
    /// Wait for the replay program and exit with its status.
    #[arg(long, default_value_t = false, conflicts_with = "dry_run")]
    pub wait: bool,
    #[command(flatten)]
    pub activation: ActivationArgs,
    /// Optional utility command.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

impl LaunchProfileArgs {
    /// Build a `LaunchProfile` from CLI args and environment variables.
    pub fn build(&self) -> Result<LaunchProfile> {
        let (config_path, config_source) = resolve_config_path(self.config_override.clone())?;
        let launch_args = build_launch_args(self.dry_run, self.wait, &config_path);

        Ok(LaunchProfile {
            config_path,
            config_source,
            dry_run: self.dry_run,
            wait: self.wait,
            launch_args,
        })
    }

    /// Parse CLI args into either launch mode or utility command mode.
    pub fn into_command(self) -> Result<ParsedCommand> {
        match self.command {
            Some(command) => {
                validate_command(command, &self)?;
                Ok(ParsedCommand::Cli {
                    command,
                    activation: self.activation.into_activation(),
                })
            }
            None => {
                let profile = self.build()?;
                Ok(ParsedCommand::Launch {
                    profile,
                    activation: self.activation.into_activation(),
                })
            }
        }
    }
}

fn validate_command(command: CliCommand, args: &LaunchProfileArgs) -> Result<()> {
    if args.wait || args.dry_run {
        let name = match command {
            CliCommand::Render => "render",
            CliCommand::Schema => "schema",
        };
        return Err(anyhow!(
            "`{name}` never forwards; --wait and --dry-run only apply to launch mode"
        ));
    }
    Ok(())
}
