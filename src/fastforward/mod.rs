//! Fast-forward core: merge activation parameters, render them, forward once.

pub mod forward;
pub mod lifecycle;
pub mod merge;
pub mod params;
pub mod render;
pub mod source;
pub mod teardown;

pub use forward::{
    ForwardRequest, Forwarder, RecordingForwarder, DEFAULT_FORWARD_KEY, DEFAULT_FORWARD_TARGET,
};
pub use lifecycle::{Activation, ForwardTarget, Lifecycle, LifecycleState, ResumeOutcome};
pub use merge::{merge, MergedParams, ParamOrigin};
pub use params::{ParamField, ParamRecord, ParamValue, RawParams, RenderMode, UNSET_FRAME};
pub use render::{render, ForwardArgs};
pub use source::{load_secondary, ParamFileSource};
pub use teardown::{DeferredAction, DEFAULT_TEARDOWN_DELAY};

use tracing::info;

use crate::lib::errors::ParamSourceError;

/// Resolve the activation's file source, merge it under the extras and render the result.
pub fn resolve_forward_args(activation: &Activation) -> Result<ForwardArgs, ParamSourceError> {
    let secondary = load_secondary(activation.json_data.as_deref())?;
    let merged = merge(&activation.extras, secondary.as_ref());
    let from_file = merged.fields_from_file();
    if !from_file.is_empty() {
        info!(
            target: "paretrace_fastforward::params",
            activation_id = %activation.id,
            fields = ?from_file,
            "Filled parameters from jsonData"
        );
    }
    Ok(render(&merged.record))
}
