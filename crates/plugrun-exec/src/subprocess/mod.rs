//! Plugin runner backed by a local child process.
//!
//! Spawns a [`plugrun_model::CommandSpec`] through `tokio::process::Command` and
//! hands the piped stdout/stderr straight to the caller.
mod runner;

pub use runner::CmdRunner;
