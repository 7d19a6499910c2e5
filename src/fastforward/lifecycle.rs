//! Activation lifecycle driven by an external caller.
//!
//! The caller delivers callbacks in host order (create, start, resume, pause,
//! stop, destroy). Entering the resumed state forwards the activation's
//! rendered arguments at most once until the next destroy.

use std::fmt;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::lib::errors::{ActivationError, LifecycleError};

use super::{
    forward::{ForwardRequest, Forwarder, DEFAULT_FORWARD_KEY, DEFAULT_FORWARD_TARGET},
    params::RawParams,
    resolve_forward_args,
    teardown::DeferredAction,
};

/// Lifecycle states; `Initialized` precedes the first callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initialized,
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    Destroyed,
}

impl LifecycleState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Initialized => "initialized",
            LifecycleState::Created => "created",
            LifecycleState::Started => "started",
            LifecycleState::Resumed => "resumed",
            LifecycleState::Paused => "paused",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inbound launch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub id: Uuid,
    pub extras: RawParams,
    pub json_data: Option<String>,
}

impl Activation {
    pub fn new(extras: RawParams, json_data: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            extras,
            json_data,
        }
    }
}

/// Downstream component and parameter key a forward is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    pub target: String,
    pub key: String,
}

impl Default for ForwardTarget {
    fn default() -> Self {
        Self {
            target: DEFAULT_FORWARD_TARGET.to_string(),
            key: DEFAULT_FORWARD_KEY.to_string(),
        }
    }
}

/// What happened on entry to the resumed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Forwarded(ForwardRequest),
    AlreadyForwarded,
}

pub struct Lifecycle<F: Forwarder> {
    activation: Activation,
    target: ForwardTarget,
    forwarder: F,
    state: LifecycleState,
    forwarded: bool,
    teardown: DeferredAction,
}

impl<F: Forwarder> Lifecycle<F> {
    pub fn new(
        activation: Activation,
        target: ForwardTarget,
        forwarder: F,
        teardown: DeferredAction,
    ) -> Self {
        Self {
            activation,
            target,
            forwarder,
            state: LifecycleState::Initialized,
            forwarded: false,
            teardown,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn has_forwarded(&self) -> bool {
        self.forwarded
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub fn forwarder(&self) -> &F {
        &self.forwarder
    }

    pub fn forwarder_mut(&mut self) -> &mut F {
        &mut self.forwarder
    }

    pub fn teardown_pending(&self) -> bool {
        self.teardown.is_pending()
    }

    pub fn on_create(&mut self) -> Result<(), LifecycleError> {
        self.transition(
            LifecycleState::Created,
            &[LifecycleState::Initialized, LifecycleState::Destroyed],
        )
    }

    pub fn on_start(&mut self) -> Result<(), LifecycleError> {
        self.transition(
            LifecycleState::Started,
            &[LifecycleState::Created, LifecycleState::Stopped],
        )
    }

    /// Enter the resumed state and forward unless this instance already did.
    pub fn on_resume(&mut self) -> Result<ResumeOutcome, ActivationError> {
        self.transition(
            LifecycleState::Resumed,
            &[LifecycleState::Started, LifecycleState::Paused],
        )?;

        if self.forwarded {
            debug!(
                target: "paretrace_fastforward::lifecycle",
                activation_id = %self.activation.id,
                "Activation already forwarded; skipping"
            );
            return Ok(ResumeOutcome::AlreadyForwarded);
        }

        let args = resolve_forward_args(&self.activation)?;
        let request = ForwardRequest {
            activation_id: self.activation.id,
            target: self.target.target.clone(),
            key: self.target.key.clone(),
            args,
            issued_at: Utc::now(),
        };
        info!(
            target: "paretrace_fastforward::forward",
            activation_id = %request.activation_id,
            target_component = %request.target,
            key = %request.key,
            args = %request.args,
            "Forwarding activation"
        );
        self.forwarder.forward(&request)?;
        self.forwarded = true;
        Ok(ResumeOutcome::Forwarded(request))
    }

    pub fn on_pause(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Paused, &[LifecycleState::Resumed])
    }

    pub fn on_stop(&mut self) -> Result<(), LifecycleError> {
        self.transition(LifecycleState::Stopped, &[LifecycleState::Paused])
    }

    /// Clear the forward guard and run the teardown action.
    pub fn on_destroy(&mut self) -> Result<(), LifecycleError> {
        self.transition(
            LifecycleState::Destroyed,
            &[LifecycleState::Created, LifecycleState::Stopped],
        )?;
        self.forwarded = false;
        self.teardown.run();
        Ok(())
    }

    /// Give up on this activation without running the teardown action.
    pub fn abort(&mut self) {
        debug!(
            target: "paretrace_fastforward::lifecycle",
            activation_id = %self.activation.id,
            state = %self.state,
            "Aborting activation"
        );
        self.teardown.cancel();
    }

    fn transition(
        &mut self,
        to: LifecycleState,
        allowed_from: &[LifecycleState],
    ) -> Result<(), LifecycleError> {
        if !allowed_from.contains(&self.state) {
            return Err(LifecycleError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(
            target: "paretrace_fastforward::lifecycle",
            activation_id = %self.activation.id,
            from = %self.state,
            to = %to,
            "Lifecycle transition"
        );
        self.state = to;
        Ok(())
    }
}
