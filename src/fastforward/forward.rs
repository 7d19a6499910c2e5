//! Forwarding seam between an activation and the replay component.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::lib::errors::ForwardError;

use super::render::ForwardArgs;

/// Parameter key the replay component reads the argument string from.
pub const DEFAULT_FORWARD_KEY: &str = "fastforward";
/// Name of the replay component used in logs when none is configured.
pub const DEFAULT_FORWARD_TARGET: &str = "RetraceActivity";

/// One forwarding activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardRequest {
    pub activation_id: Uuid,
    pub target: String,
    pub key: String,
    pub args: ForwardArgs,
    pub issued_at: DateTime<Utc>,
}

/// Hands a rendered argument string to the replay component.
pub trait Forwarder {
    fn forward(&mut self, request: &ForwardRequest) -> Result<(), ForwardError>;
}

/// Keeps every request in memory.
#[derive(Debug, Default)]
pub struct RecordingForwarder {
    requests: Vec<ForwardRequest>,
}

impl RecordingForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> &[ForwardRequest] {
        &self.requests
    }
}

impl Forwarder for RecordingForwarder {
    fn forward(&mut self, request: &ForwardRequest) -> Result<(), ForwardError> {
        self.requests.push(request.clone());
        Ok(())
    }
}

impl<F: Forwarder + ?Sized> Forwarder for &mut F {
    fn forward(&mut self, request: &ForwardRequest) -> Result<(), ForwardError> {
        (**self).forward(request)
    }
}
