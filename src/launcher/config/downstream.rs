use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    fastforward::{DEFAULT_FORWARD_KEY, DEFAULT_FORWARD_TARGET},
    lib::errors::ConfigError,
};

pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 3600;
const MAX_WAIT_TIMEOUT_SECS: u64 = 86_400;

/// Replay program the rendered arguments are forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownstreamSection {
    /// `None` is only usable with the dry-run forwarder.
    pub program: Option<PathBuf>,
    /// Arguments placed before `--<key> <args>`.
    pub args: Vec<String>,
    pub target: String,
    pub key: String,
    pub wait_timeout_secs: u64,
}

impl Default for DownstreamSection {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            target: DEFAULT_FORWARD_TARGET.to_string(),
            key: DEFAULT_FORWARD_KEY.to_string(),
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawDownstreamSection {
    pub program: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    pub target: Option<String>,
    pub key: Option<String>,
    pub wait_timeout_secs: Option<u64>,
}

pub fn parse_downstream_section(
    raw: Option<RawDownstreamSection>,
    path: &Path,
) -> Result<DownstreamSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let defaults = DownstreamSection::default();

    if let Some(program) = &raw.program {
        if program.as_os_str().is_empty() {
            return Err(invalid(path, "downstream.program", "Use a non-empty path"));
        }
    }

    let target = raw.target.unwrap_or(defaults.target);
    if target.trim().is_empty() {
        return Err(invalid(path, "downstream.target", "Use a non-empty name"));
    }

    let key = raw.key.unwrap_or(defaults.key);
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(invalid(
            path,
            "downstream.key",
            "Use a non-empty key without whitespace",
        ));
    }

    let wait_timeout_secs = raw.wait_timeout_secs.unwrap_or(defaults.wait_timeout_secs);
    if !(1..=MAX_WAIT_TIMEOUT_SECS).contains(&wait_timeout_secs) {
        return Err(invalid(
            path,
            "downstream.wait_timeout_secs",
            "Use a value in the range 1-86400",
        ));
    }

    Ok(DownstreamSection {
        program: raw.program,
        args: raw.args.unwrap_or_default(),
        target,
        key,
        wait_timeout_secs,
    })
}

fn invalid(path: &Path, field: &'static str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: message.into(),
    }
}
