//! Library crate root re-exporting the fast-forward core, launcher and CLI modules.

#[path = "lib/mod.rs"]
pub mod lib_mod;
pub use lib_mod as lib;
pub mod cli;
pub mod fastforward;
pub mod launcher;
