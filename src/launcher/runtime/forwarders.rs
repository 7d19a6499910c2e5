use std::{
    io::{self, Write},
    path::PathBuf,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use serde_json::Value;
use tokio::{
    process::{Child, Command},
    time,
};
use tracing::{info, warn};

use crate::{
    fastforward::{ForwardRequest, Forwarder},
    launcher::config::DownstreamSection,
    lib::errors::ForwardError,
};

/// Spawns the replay program with the rendered arguments as one argv entry.
#[derive(Debug)]
pub struct ProcessForwarder {
    program: PathBuf,
    prefix_args: Vec<String>,
    child: Option<Child>,
}

impl ProcessForwarder {
    pub fn new(program: PathBuf, prefix_args: Vec<String>) -> Self {
        Self {
            program,
            prefix_args,
            child: None,
        }
    }

    pub fn from_config(downstream: &DownstreamSection) -> Result<Self, ForwardError> {
        let program = downstream
            .program
            .clone()
            .ok_or(ForwardError::MissingProgram)?;
        Ok(Self::new(program, downstream.args.clone()))
    }

    /// Arguments passed to the program for `request`.
    pub fn command_args(&self, request: &ForwardRequest) -> Vec<String> {
        let mut args = self.prefix_args.clone();
        args.push(format!("--{}", request.key));
        args.push(request.args.as_str().to_string());
        args
    }

    /// Wait for the spawned program. Returns `None` if nothing was spawned.
    pub async fn wait(&mut self, timeout: Duration) -> Result<Option<ExitStatus>, ForwardError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };

        let status = match time::timeout(timeout, child.wait()).await {
            Ok(result) => result.map_err(|source| ForwardError::Wait { source })?,
            Err(_) => {
                warn!(
                    target: "paretrace_fastforward::forward",
                    pid = ?child.id(),
                    timeout_secs = timeout.as_secs(),
                    "Replay program still running after timeout; leaving it running"
                );
                return Err(ForwardError::Timeout {
                    duration_secs: timeout.as_secs(),
                });
            }
        };

        self.child = None;
        info!(
            target: "paretrace_fastforward::forward",
            exit_code = ?status.code(),
            "Replay program exited"
        );
        Ok(Some(status))
    }
}

impl Forwarder for ProcessForwarder {
    fn forward(&mut self, request: &ForwardRequest) -> Result<(), ForwardError> {
        let mut command = Command::new(&self.program);
        command
            .args(self.command_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = command.spawn().map_err(|source| ForwardError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        info!(
            target: "paretrace_fastforward::forward",
            activation_id = %request.activation_id,
            program = %self.program.display(),
            pid = ?child.id(),
            "Spawned replay program"
        );
        self.child = Some(child);
        Ok(())
    }
}

/// Writes each request as a JSON document instead of launching anything.
#[derive(Debug)]
pub struct DryRunForwarder<W: Write> {
    writer: W,
}

impl DryRunForwarder<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DryRunForwarder<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Forwarder for DryRunForwarder<W> {
    fn forward(&mut self, request: &ForwardRequest) -> Result<(), ForwardError> {
        let mut payload = serde_json::to_value(request).map_err(|err| ForwardError::Emit {
            message: err.to_string(),
        })?;
        if let Value::Object(map) = &mut payload {
            map.insert("status".into(), Value::String("forwarded".into()));
        }
        let serialized =
            serde_json::to_string_pretty(&payload).map_err(|err| ForwardError::Emit {
                message: err.to_string(),
            })?;
        writeln!(self.writer, "{serialized}")
            .and_then(|_| self.writer.flush())
            .map_err(|err| ForwardError::Emit {
                message: err.to_string(),
            })
    }
}

/// Forwarder selected by the launch profile.
#[derive(Debug)]
pub enum LauncherForwarder {
    Process(ProcessForwarder),
    DryRun(DryRunForwarder<io::Stdout>),
}

impl LauncherForwarder {
    pub const fn kind(&self) -> &'static str {
        match self {
            LauncherForwarder::Process(_) => "process",
            LauncherForwarder::DryRun(_) => "dry_run",
        }
    }

    pub async fn wait(&mut self, timeout: Duration) -> Result<Option<ExitStatus>, ForwardError> {
        match self {
            LauncherForwarder::Process(forwarder) => forwarder.wait(timeout).await,
            LauncherForwarder::DryRun(_) => Ok(None),
        }
    }
}

impl Forwarder for LauncherForwarder {
    fn forward(&mut self, request: &ForwardRequest) -> Result<(), ForwardError> {
        match self {
            LauncherForwarder::Process(forwarder) => forwarder.forward(request),
            LauncherForwarder::DryRun(forwarder) => forwarder.forward(request),
        }
    }
}
