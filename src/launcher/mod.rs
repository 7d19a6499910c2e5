//! Launcher configuration and runtime binding the fast-forward core to a process.
pub mod config;
pub mod runtime;
