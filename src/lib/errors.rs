use std::{io, path::PathBuf, process::ExitCode};

use config::ConfigError as ConfigLoaderError;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::fastforward::LifecycleState;

/// Errors that can occur while loading or validating the launcher configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to build (read) the configuration file.
    #[error("Failed to read configuration file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize TOML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Helper to wrap `config::ConfigError` as a read failure.
    pub fn from_read_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::FileRead { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }
}

/// Failures while resolving the JSON parameter source of an activation.
#[derive(Debug, Error)]
pub enum ParamSourceError {
    #[error("Failed to read parameter file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse parameters from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while handing the rendered arguments to the replay program.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("No downstream program configured (set downstream.program or use --dry-run)")]
    MissingProgram,
    #[error("Failed to spawn downstream program {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to wait for downstream program: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
    #[error("Downstream program did not exit within {duration_secs} seconds")]
    Timeout { duration_secs: u64 },
    #[error("Failed to emit forward request: {message}")]
    Emit { message: String },
}

/// Lifecycle callbacks delivered out of order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}

/// Everything that can stop an activation on entry to the resumed state.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    ParamSource(#[from] ParamSourceError),
    #[error(transparent)]
    Forward(#[from] ForwardError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Structured metadata attached to a fatal process exit.
#[derive(Debug, Clone)]
pub struct ExitDescriptor {
    /// Error code.
    pub code: &'static str,
    /// User-facing message.
    pub message: &'static str,
    /// Recommended remediation.
    pub remediation: &'static str,
    /// Process exit status.
    pub exit_code: u8,
}

impl ExitDescriptor {
    pub const fn new(
        code: &'static str,
        message: &'static str,
        remediation: &'static str,
        exit_code: u8,
    ) -> Self {
        Self {
            code,
            message,
            remediation,
            exit_code,
        }
    }

    pub fn builder(&self) -> ExitReportBuilder<'_> {
        ExitReportBuilder::new(self)
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code)
    }
}

/// Builder for exit payloads that fails if required fields are missing.
pub struct ExitReportBuilder<'a> {
    descriptor: &'a ExitDescriptor,
    retryable: Option<bool>,
    details: Option<Value>,
    extra_fields: Map<String, Value>,
}

impl<'a> ExitReportBuilder<'a> {
    pub fn new(descriptor: &'a ExitDescriptor) -> Self {
        Self {
            descriptor,
            retryable: None,
            details: None,
            extra_fields: Map::new(),
        }
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.retryable = Some(retryable);
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_context_field(mut self, key: &str, value: Value) -> Self {
        self.extra_fields.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Result<Value, ExitReportBuilderError> {
        if self.descriptor.remediation.trim().is_empty() {
            return Err(ExitReportBuilderError::MissingRemediation {
                code: self.descriptor.code,
            });
        }
        let retryable = self
            .retryable
            .ok_or(ExitReportBuilderError::MissingRetryable {
                code: self.descriptor.code,
            })?;

        let mut data = Map::new();
        data.insert("code".into(), Value::String(self.descriptor.code.into()));
        data.insert(
            "message".into(),
            Value::String(self.descriptor.message.into()),
        );
        data.insert(
            "remediation".into(),
            Value::String(self.descriptor.remediation.into()),
        );
        data.insert("retryable".into(), Value::Bool(retryable));
        data.insert(
            "exit_code".into(),
            Value::Number(Number::from(self.descriptor.exit_code)),
        );
        if let Some(details) = self.details {
            data.insert("details".into(), details);
        }
        for (key, value) in self.extra_fields {
            data.insert(key, value);
        }

        Ok(Value::Object(data))
    }
}

/// Errors when required builder fields are missing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExitReportBuilderError {
    #[error("retryable is missing (code={code})")]
    MissingRetryable { code: &'static str },
    #[error("remediation is empty (code={code})")]
    MissingRemediation { code: &'static str },
}

/// The JSON parameter file could not be read or parsed; nothing was forwarded.
pub const PARAM_SOURCE_INVALID_ERROR: ExitDescriptor = ExitDescriptor::new(
    "PARAM_SOURCE_INVALID",
    "jsonData could not be read or parsed as a parameter object",
    "Check that the jsonData path exists and holds a JSON object with correctly typed fields.",
    65,
);

/// The downstream replay program could not be started or awaited.
pub const FORWARD_FAILED_ERROR: ExitDescriptor = ExitDescriptor::new(
    "FORWARD_FAILED",
    "The replay program could not be launched or awaited",
    "Check downstream.program in the launcher config, or re-run with --dry-run.",
    69,
);

/// The replay program was launched but did not exit before the `--wait` timeout.
pub const DOWNSTREAM_TIMEOUT_ERROR: ExitDescriptor = ExitDescriptor::new(
    "DOWNSTREAM_TIMEOUT",
    "The replay program was launched but did not exit before the wait timeout",
    "Raise downstream.wait_timeout_secs or drop --wait; the replay program is still running.",
    75,
);

/// The launcher configuration file is unreadable or invalid.
pub const LAUNCHER_CONFIG_INVALID_ERROR: ExitDescriptor = ExitDescriptor::new(
    "LAUNCHER_CONFIG_INVALID",
    "The launcher configuration could not be loaded",
    "Fix the file named by --config or PARETRACE_FASTFORWARD_CONFIG.",
    78,
);
