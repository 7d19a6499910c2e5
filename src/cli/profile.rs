//! LaunchProfile and launcher config path resolution.
use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::{
    launcher::config::{CONFIG_ENV_KEY, DEFAULT_CONFIG_PATH},
    lib::{fs::absolutize, paths::is_nonempty_absolute},
};

/// Where the launcher config path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    Env,
    Default,
}

impl ConfigSource {
    /// Explicitly named files must exist; the default file is optional.
    pub const fn is_explicit(&self) -> bool {
        !matches!(self, ConfigSource::Default)
    }
}

/// Resolved launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub config_path: PathBuf,
    pub config_source: ConfigSource,
    pub dry_run: bool,
    pub wait: bool,
    pub launch_args: Vec<String>,
}

/// Resolve config path in the order: CLI override → env var → default.
pub fn resolve_config_path(override_path: Option<PathBuf>) -> Result<(PathBuf, ConfigSource)> {
    resolve_config_path_from(
        override_path,
        env::var_os(CONFIG_ENV_KEY).map(PathBuf::from),
    )
}

fn resolve_config_path_from(
    override_path: Option<PathBuf>,
    env_path: Option<PathBuf>,
) -> Result<(PathBuf, ConfigSource)> {
    let (path, source) = match (override_path, env_path) {
        (Some(path), _) => (path, ConfigSource::Cli),
        (None, Some(path)) if !path.as_os_str().is_empty() => (path, ConfigSource::Env),
        _ => (PathBuf::from(DEFAULT_CONFIG_PATH), ConfigSource::Default),
    };

    if is_nonempty_absolute(&path) {
        return Ok((path, source));
    }

    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok((absolutize(&cwd, path), source))
}

/// Build launch arguments suitable for reproduction/logging.
pub fn build_launch_args(dry_run: bool, wait: bool, config: &Path) -> Vec<String> {
    let mut args = vec![format!("--config={}", config.display())];
    if dry_run {
        args.push("--dry-run".into());
    }
    if wait {
        args.push("--wait".into());
    }
    args
}
