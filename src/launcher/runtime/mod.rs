//! Launcher runtime: forwarder selection, activation driving and exit mapping.
mod forwarders;
mod startup;

pub use forwarders::{DryRunForwarder, LauncherForwarder, ProcessForwarder};
pub use startup::{
    build_forwarder, build_teardown, downstream_exit_code, run_activation, RuntimeExit,
};
