use std::{process::ExitCode, time::Duration};

use anyhow::Error;
use serde_json::{json, Value};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::{
    cli::LaunchProfile,
    fastforward::{Activation, DeferredAction, ForwardTarget, Lifecycle, ResumeOutcome},
    launcher::config::{LauncherConfig, TeardownSection},
    lib::{
        errors::{
            ActivationError, ConfigError, ExitDescriptor, ForwardError, ParamSourceError,
            DOWNSTREAM_TIMEOUT_ERROR, FORWARD_FAILED_ERROR, LAUNCHER_CONFIG_INVALID_ERROR,
            PARAM_SOURCE_INVALID_ERROR,
        },
        telemetry::{self, ActivationSpan, LaunchModeTelemetry},
    },
};

use super::forwarders::{DryRunForwarder, LauncherForwarder, ProcessForwarder};

/// Bundles a runtime error message with an exit code and optional structured payload.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
    raw_exit_code: u8,
    payload: Option<Value>,
}

impl RuntimeExit {
    /// Build a structured exit from a descriptor plus details.
    pub fn structured(
        descriptor: &ExitDescriptor,
        retryable: bool,
        details: Value,
        activation_id: Option<Uuid>,
    ) -> Self {
        let mut builder = descriptor
            .builder()
            .retryable(retryable)
            .details(details.clone());
        if let Some(id) = activation_id {
            builder = builder.with_context_field("activation_id", json!(id.to_string()));
        }
        let payload = builder.build().unwrap_or_else(|err| {
            json!({
                "code": descriptor.code,
                "message": descriptor.message,
                "builder_error": err.to_string(),
                "details": details,
            })
        });
        Self {
            message: descriptor.message.to_string(),
            exit_code: descriptor.exit_code(),
            raw_exit_code: descriptor.exit_code,
            payload: Some(payload),
        }
    }

    /// Map an error to an exit, recognising the crate's fatal error kinds.
    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        if let Some(source) = err.downcast_ref::<ParamSourceError>() {
            return Self::param_source(source, None);
        }
        if let Some(source) = err.downcast_ref::<ForwardError>() {
            return Self::forward(source, None);
        }
        if let Some(source) = err.downcast_ref::<ConfigError>() {
            return Self::config(source);
        }
        Self {
            message: format!("{err:?}"),
            exit_code: ExitCode::FAILURE,
            raw_exit_code: 1,
            payload: None,
        }
    }

    pub fn from_activation_error(err: ActivationError, activation_id: Uuid) -> Self {
        match err {
            ActivationError::ParamSource(source) => {
                Self::param_source(&source, Some(activation_id))
            }
            ActivationError::Forward(source) => Self::forward(&source, Some(activation_id)),
            ActivationError::Lifecycle(source) => Self::from_error(source),
        }
    }

    /// The replay program exited unsuccessfully while the launcher waited for it.
    pub fn downstream_status(code: u8) -> Self {
        Self {
            message: format!("replay program exited with status {code}"),
            exit_code: ExitCode::from(code),
            raw_exit_code: code,
            payload: None,
        }
    }

    fn param_source(source: &ParamSourceError, activation_id: Option<Uuid>) -> Self {
        Self::structured(
            &PARAM_SOURCE_INVALID_ERROR,
            false,
            json!({ "reason": source.to_string() }),
            activation_id,
        )
    }

    fn forward(source: &ForwardError, activation_id: Option<Uuid>) -> Self {
        let details = json!({ "reason": source.to_string() });
        match source {
            // The program was launched; only the wait gave up.
            ForwardError::Timeout { .. } => {
                Self::structured(&DOWNSTREAM_TIMEOUT_ERROR, true, details, activation_id)
            }
            _ => Self::structured(&FORWARD_FAILED_ERROR, false, details, activation_id),
        }
    }

    fn config(source: &ConfigError) -> Self {
        Self::structured(
            &LAUNCHER_CONFIG_INVALID_ERROR,
            false,
            json!({ "reason": source.to_string() }),
            None,
        )
    }

    pub fn report(self) -> ExitCode {
        if let Some(payload) = self.payload {
            if let Ok(serialized) = serde_json::to_string(&payload) {
                eprintln!("{serialized}");
            } else {
                eprintln!("{}", self.message);
            }
        } else {
            eprintln!("{}", self.message);
        }
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn raw_exit_code(&self) -> u8 {
        self.raw_exit_code
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

/// Convert a child exit code into a launcher status; signals map to 1.
pub fn downstream_exit_code(code: Option<i32>) -> u8 {
    match code {
        Some(0) => 0,
        Some(code) => u8::try_from(code.clamp(1, 255)).unwrap_or(1),
        None => 1,
    }
}

/// Build the deferred action run after the lifecycle is destroyed.
pub fn build_teardown(section: &TeardownSection) -> DeferredAction {
    let force_exit = section.force_exit;
    DeferredAction::new(section.delay, move || {
        info!(
            target: "paretrace_fastforward::runtime",
            force_exit,
            "Teardown delay elapsed"
        );
    })
}

/// Build the forwarder selected by the launch profile.
pub fn build_forwarder(
    profile: &LaunchProfile,
    config: &LauncherConfig,
) -> Result<LauncherForwarder, ForwardError> {
    if profile.dry_run {
        return Ok(LauncherForwarder::DryRun(DryRunForwarder::stdout()));
    }
    ProcessForwarder::from_config(&config.downstream).map(LauncherForwarder::Process)
}

/// Drive one activation through create, start and resume, then tear it down.
pub async fn run_activation(
    profile: &LaunchProfile,
    config: LauncherConfig,
    activation: Activation,
) -> Result<(), RuntimeExit> {
    let activation_id = activation.id;
    let forwarder = build_forwarder(profile, &config)
        .map_err(|err| RuntimeExit::forward(&err, Some(activation_id)))?;
    telemetry::emit_launch_mode(&LaunchModeTelemetry {
        forwarder: forwarder.kind(),
        target: &config.downstream.target,
        config_path: config.source_path.to_string_lossy().as_ref(),
        wait: profile.wait,
        teardown_delay_ms: config.teardown.delay.as_millis() as u64,
        force_exit: config.teardown.force_exit,
        launch_args: &profile.launch_args,
    });

    let teardown = build_teardown(&config.teardown);
    let target = ForwardTarget {
        target: config.downstream.target.clone(),
        key: config.downstream.key.clone(),
    };
    let span = ActivationSpan::start(activation_id);
    let mut lifecycle = Lifecycle::new(activation, target, forwarder, teardown);
    let wait_timeout = profile
        .wait
        .then(|| Duration::from_secs(config.downstream.wait_timeout_secs));

    let driven = drive(&mut lifecycle, wait_timeout)
        .instrument(span.span().clone())
        .await;
    let code = match driven {
        Ok(code) => code,
        Err(exit) => {
            lifecycle.abort();
            span.finish("failed", Some(i32::from(exit.raw_exit_code())));
            return Err(exit);
        }
    };

    if code != 0 {
        warn!(
            target: "paretrace_fastforward::runtime",
            exit_code = code,
            "Replay program reported failure"
        );
    }
    span.finish("forwarded", Some(i32::from(code)));

    // Teardown sleeps for its delay; run it on the blocking pool.
    tokio::task::spawn_blocking(move || {
        lifecycle.on_pause()?;
        lifecycle.on_stop()?;
        lifecycle.on_destroy()
    })
    .await
    .map_err(RuntimeExit::from_error)?
    .map_err(RuntimeExit::from_error)?;

    if code == 0 {
        Ok(())
    } else {
        Err(RuntimeExit::downstream_status(code))
    }
}

async fn drive(
    lifecycle: &mut Lifecycle<LauncherForwarder>,
    wait_timeout: Option<Duration>,
) -> Result<u8, RuntimeExit> {
    let activation_id = lifecycle.activation().id;
    lifecycle.on_create().map_err(RuntimeExit::from_error)?;
    lifecycle.on_start().map_err(RuntimeExit::from_error)?;
    let outcome = lifecycle
        .on_resume()
        .map_err(|err| RuntimeExit::from_activation_error(err, activation_id))?;
    if let ResumeOutcome::Forwarded(request) = &outcome {
        debug!(
            target: "paretrace_fastforward::runtime",
            issued_at = %request.issued_at,
            "Forward issued"
        );
    }

    let Some(timeout) = wait_timeout else {
        return Ok(0);
    };
    let status = lifecycle
        .forwarder_mut()
        .wait(timeout)
        .await
        .map_err(|err| RuntimeExit::forward(&err, Some(activation_id)))?;
    Ok(status.map_or(0, |status| downstream_exit_code(status.code())))
}

#[cfg(test)]
mod tests {
    use std::{
        path::PathBuf,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Instant,
    };

    use super::*;
    use crate::{cli::ConfigSource, fastforward::RawParams};

    #[test]
    fn param_source_errors_map_to_distinguished_status() {
        let source = serde_json::from_str::<Value>("{").expect_err("truncated JSON must fail");
        let exit = RuntimeExit::from_error(ParamSourceError::Parse {
            origin: "inline jsonData".into(),
            source,
        });

        assert_eq!(exit.exit_code(), ExitCode::from(65));
        let payload = exit.payload().expect("payload must exist");
        assert_eq!(payload["code"], "PARAM_SOURCE_INVALID");
        assert_eq!(payload["retryable"], false);
        assert!(payload.get("activation_id").is_none());
    }

    #[test]
    fn forward_and_config_errors_have_their_own_statuses() {
        let activation_id = Uuid::new_v4();
        let forward = RuntimeExit::from_activation_error(
            ActivationError::Forward(ForwardError::MissingProgram),
            activation_id,
        );
        assert_eq!(forward.raw_exit_code(), 69);

        let config = RuntimeExit::from_error(ConfigError::MissingField {
            path: "fastforward.toml".into(),
            field: "downstream.program",
        });
        assert_eq!(config.raw_exit_code(), 78);

        let other = RuntimeExit::from_error(anyhow::anyhow!("unexpected"));
        assert_eq!(other.raw_exit_code(), 1);
        assert!(other.payload().is_none());
    }

    #[test]
    fn activation_failures_carry_activation_id() {
        let activation_id = Uuid::new_v4();
        let source = serde_json::from_str::<Value>("[").expect_err("truncated JSON must fail");
        let exit = RuntimeExit::from_activation_error(
            ActivationError::ParamSource(ParamSourceError::Parse {
                origin: "inline jsonData".into(),
                source,
            }),
            activation_id,
        );

        let payload = exit.payload().expect("payload must exist");
        assert_eq!(payload["activation_id"], activation_id.to_string());
        assert_eq!(payload["code"], "PARAM_SOURCE_INVALID");
    }

    #[test]
    fn wait_timeout_is_reported_apart_from_launch_failure() {
        let activation_id = Uuid::new_v4();
        let exit = RuntimeExit::from_activation_error(
            ActivationError::Forward(ForwardError::Timeout { duration_secs: 5 }),
            activation_id,
        );

        assert_eq!(exit.raw_exit_code(), 75);
        let payload = exit.payload().expect("payload must exist");
        assert_eq!(payload["code"], "DOWNSTREAM_TIMEOUT");
        assert_eq!(payload["retryable"], true);
        assert_eq!(payload["activation_id"], activation_id.to_string());

        let spawn = RuntimeExit::from_error(ForwardError::Spawn {
            program: PathBuf::from("/nonexistent/paretrace"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
        assert_eq!(spawn.raw_exit_code(), 69);
        assert_eq!(
            spawn.payload().expect("payload must exist")["code"],
            "FORWARD_FAILED"
        );
    }

    #[test]
    fn downstream_codes_are_clamped() {
        assert_eq!(downstream_exit_code(Some(0)), 0);
        assert_eq!(downstream_exit_code(Some(3)), 3);
        assert_eq!(downstream_exit_code(Some(-9)), 1);
        assert_eq!(downstream_exit_code(Some(300)), 255);
        assert_eq!(downstream_exit_code(None), 1);
    }

    #[test]
    fn teardown_runs_once_without_exiting() {
        let section = TeardownSection {
            delay: Duration::ZERO,
            force_exit: true,
        };
        let mut action = build_teardown(&section);
        assert!(action.is_pending());
        action.run();
        assert!(!action.is_pending());
    }

    #[test]
    fn deferred_action_observes_state_set_before_run() {
        let observed = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&observed);
        let mut action = DeferredAction::new(Duration::ZERO, move || {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        action.run();
        action.run();
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn teardown_delay_does_not_stall_the_runtime() {
        let mut config = LauncherConfig::defaults(PathBuf::from("fastforward.toml"));
        config.teardown = TeardownSection {
            delay: Duration::from_millis(300),
            force_exit: false,
        };
        let profile = LaunchProfile {
            config_path: PathBuf::from("fastforward.toml"),
            config_source: ConfigSource::Default,
            dry_run: true,
            wait: false,
            launch_args: Vec::new(),
        };
        let activation = Activation::new(RawParams::default(), None);

        let ticker = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Instant::now()
        });
        run_activation(&profile, config, activation)
            .await
            .expect("dry run should succeed");
        let finished = Instant::now();
        let ticked = ticker.await.expect("ticker should complete");

        assert!(ticked < finished, "runtime was blocked during teardown");
    }
}
