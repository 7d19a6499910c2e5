//! Load and validate the launcher configuration.
use std::{env, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::errors::ConfigError;

pub mod downstream;
pub mod teardown;
pub mod telemetry;

pub use downstream::{
    parse_downstream_section, DownstreamSection, RawDownstreamSection, DEFAULT_WAIT_TIMEOUT_SECS,
};
pub use teardown::{parse_teardown_section, RawTeardownSection, TeardownSection};

pub const CONFIG_ENV_KEY: &str = "PARETRACE_FASTFORWARD_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "fastforward.toml";

/// Top-level configuration container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub downstream: DownstreamSection,
    pub teardown: TeardownSection,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawLauncherConfig {
    downstream: Option<RawDownstreamSection>,
    teardown: Option<RawTeardownSection>,
}

impl LauncherConfig {
    /// Built-in settings, used when the default file does not exist.
    pub fn defaults(source_path: PathBuf) -> Self {
        Self {
            downstream: DownstreamSection::default(),
            teardown: TeardownSection::default(),
            source_path,
        }
    }

    /// Prefer `PARETRACE_FASTFORWARD_CONFIG` if set; otherwise read `fastforward.toml` if present.
    pub fn load_from_env_or_default() -> Result<Self, ConfigError> {
        let (path, from_env) = match env::var(CONFIG_ENV_KEY) {
            Ok(value) if !value.trim().is_empty() => (PathBuf::from(value), true),
            _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        telemetry::log_env_source(&path, from_env);
        Self::load_from_path(path, from_env)
    }

    /// Load configuration from a specific path. A missing file is an error only when `required`.
    pub fn load_from_path(path: PathBuf, required: bool) -> Result<Self, ConfigError> {
        info!(
            target: "paretrace_fastforward::config",
            path = %path.display(),
            required,
            "Starting configuration load"
        );

        let builder = config::Config::builder()
            .add_source(config::File::from(path.clone()).required(required));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_read_error(path.clone(), err);
            error!(
                target: "paretrace_fastforward::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let raw: RawLauncherConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "paretrace_fastforward::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "paretrace_fastforward::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawLauncherConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let downstream = parse_downstream_section(raw.downstream, &path)?;
        let teardown = parse_teardown_section(raw.teardown, &path)?;

        Ok(Self {
            downstream,
            teardown,
            source_path: path,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        path::{Path, PathBuf},
        time::Duration,
    };

    use tempfile::tempdir;

    use crate::lib::errors::ConfigError;

    use super::LauncherConfig;

    fn fixture_path(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name)
    }

    fn with_config_env<T>(path: &Path, test: impl FnOnce() -> T) -> T {
        let original = env::var(super::CONFIG_ENV_KEY).ok();
        env::set_var(super::CONFIG_ENV_KEY, path);
        let result = test();
        match original {
            Some(value) => env::set_var(super::CONFIG_ENV_KEY, value),
            None => env::remove_var(super::CONFIG_ENV_KEY),
        }
        result
    }

    #[test]
    fn load_valid_config() {
        let config = LauncherConfig::load_from_path(fixture_path("launcher_valid.toml"), true)
            .expect("launcher_valid.toml should load");

        assert_eq!(
            config.downstream.program,
            Some(PathBuf::from("/opt/paretrace/bin/paretrace"))
        );
        assert_eq!(
            config.downstream.args,
            vec![String::from("--log"), String::from("info")]
        );
        assert_eq!(config.downstream.target, "RetraceActivity");
        assert_eq!(config.downstream.key, "fastforward");
        assert_eq!(config.downstream.wait_timeout_secs, 120);
        assert_eq!(config.teardown.delay, Duration::from_millis(250));
        assert!(!config.teardown.force_exit);
    }

    #[test]
    fn missing_optional_file_uses_defaults() {
        let temp = tempdir().expect("can create temporary directory");
        let path = temp.path().join("fastforward.toml");

        let config =
            LauncherConfig::load_from_path(path.clone(), false).expect("defaults should apply");
        assert_eq!(config, LauncherConfig::defaults(path));
        assert_eq!(config.downstream.program, None);
        assert_eq!(config.teardown.delay, Duration::from_millis(500));
        assert!(config.teardown.force_exit);
    }

    #[test]
    fn missing_required_file_returns_read_error() {
        let temp = tempdir().expect("can create temporary directory");
        let error = LauncherConfig::load_from_path(temp.path().join("absent.toml"), true)
            .expect_err("required file must exist");

        assert!(matches!(error, ConfigError::FileRead { .. }), "{error:?}");
    }

    #[test]
    fn wrong_value_type_returns_parse_error() {
        let error = LauncherConfig::load_from_path(fixture_path("launcher_wrong_type.toml"), true)
            .expect_err("string timeout must fail");

        assert!(matches!(error, ConfigError::Parse { .. }), "{error:?}");
    }

    #[test]
    fn excessive_delay_returns_error() {
        let error =
            LauncherConfig::load_from_path(fixture_path("launcher_invalid_delay.toml"), true)
                .expect_err("should error for an excessive delay");

        match error {
            ConfigError::InvalidField { field, .. } => assert_eq!(field, "teardown.delay_ms"),
            other => panic!("Unexpected error: {other:?}", other = other),
        }
    }

    #[test]
    fn key_with_whitespace_returns_error() {
        let error = LauncherConfig::load_from_path(fixture_path("launcher_invalid_key.toml"), true)
            .expect_err("should error for a key with whitespace");

        match error {
            ConfigError::InvalidField { field, .. } => assert_eq!(field, "downstream.key"),
            other => panic!("Unexpected error: {other:?}", other = other),
        }
    }

    #[test]
    fn load_config_from_env_override() {
        let path = fixture_path("launcher_valid.toml");
        let config = with_config_env(&path, || {
            LauncherConfig::load_from_env_or_default()
                .expect("should load via environment variable")
        });

        assert_eq!(config.source_path, path);
        assert_eq!(config.downstream.wait_timeout_secs, 120);
    }
}
