//! Telemetry initialization and activation span helpers.

use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, info_span, Span};
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialize `tracing` and format developer logs.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper to record start and finish of one activation.
pub struct ActivationSpan {
    span: Span,
    started_at: Instant,
    activation_id: Uuid,
}

impl ActivationSpan {
    /// Start an activation span.
    pub fn start(activation_id: Uuid) -> Self {
        let span = info_span!(
            target: "paretrace_fastforward::runtime",
            "activation",
            %activation_id
        );
        Self {
            span,
            started_at: Instant::now(),
            activation_id,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span while recording status and completion info.
    pub fn finish(self, status: &'static str, exit_code: Option<i32>) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "paretrace_fastforward::runtime",
            activation_id = %self.activation_id,
            status = status,
            exit_code = exit_code,
            elapsed_ms = elapsed_ms,
            "Completed activation"
        );
    }
}

/// Launcher state emitted once per run as structured telemetry.
#[derive(Debug, Serialize)]
pub struct LaunchModeTelemetry<'a> {
    pub forwarder: &'a str,
    pub target: &'a str,
    pub config_path: &'a str,
    pub wait: bool,
    pub teardown_delay_ms: u64,
    pub force_exit: bool,
    pub launch_args: &'a [String],
}

/// Emit launch mode to `tracing`.
pub fn emit_launch_mode(telemetry: &LaunchModeTelemetry<'_>) {
    info!(
        target: "paretrace_fastforward::runtime",
        forwarder = telemetry.forwarder,
        target_component = telemetry.target,
        config_path = telemetry.config_path,
        wait = telemetry.wait,
        teardown_delay_ms = telemetry.teardown_delay_ms,
        force_exit = telemetry.force_exit,
        launch_args = ?telemetry.launch_args,
        "Starting fast-forward launcher"
    );
}
