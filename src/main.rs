//! Entry point for the paretrace fast-forward launcher.
use std::process::ExitCode;

use anyhow::Error;
use clap::Parser;
use paretrace_fastforward::{
    cli::{execute_cli_command, CliCommand, LaunchProfile, LaunchProfileArgs, ParsedCommand},
    fastforward::Activation,
    launcher::{
        config::LauncherConfig,
        runtime::{self, RuntimeExit},
    },
    lib::telemetry,
};
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let mut force_exit = false;
    let (exit_code, raw_exit_code) = match bootstrap(&mut force_exit).await {
        Ok(_) => (ExitCode::SUCCESS, 0),
        Err(exit) => {
            let raw_exit_code = exit.raw_exit_code();
            (exit.report(), raw_exit_code)
        }
    };

    if force_exit {
        // Skip runtime shutdown so a still-running replay child is not awaited.
        info!(
            target: "paretrace_fastforward::runtime",
            exit_code = raw_exit_code,
            "Forcing launcher exit"
        );
        std::process::exit(i32::from(raw_exit_code));
    }
    exit_code
}

async fn bootstrap(force_exit: &mut bool) -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = LaunchProfileArgs::parse();
    let command = args.into_command().map_err(RuntimeExit::from_error)?;

    match command {
        ParsedCommand::Launch {
            profile,
            activation,
        } => launch(profile, activation, force_exit).await,
        ParsedCommand::Cli {
            command,
            activation,
        } => handle_cli_command(command, &activation),
    }
}

async fn launch(
    profile: LaunchProfile,
    activation: Activation,
    force_exit: &mut bool,
) -> Result<(), RuntimeExit> {
    let config = LauncherConfig::load_from_path(
        profile.config_path.clone(),
        profile.config_source.is_explicit(),
    )
    .map_err(|err| RuntimeExit::from_error(Error::new(err)))?;
    *force_exit = config.teardown.force_exit;
    runtime::run_activation(&profile, config, activation).await
}

fn handle_cli_command(command: CliCommand, activation: &Activation) -> Result<(), RuntimeExit> {
    let message = execute_cli_command(command, activation).map_err(RuntimeExit::from_error)?;
    println!("{message}");
    Ok(())
}
