//! Logging bootstrap for processes embedding plugin runners.
//!
//! Runners only emit `tracing` events; a host calls [`init_logger`] once to
//! decide where they go.
mod config;
mod error;
mod format;
mod init;

pub use config::{LoggerConfig, LoggerLevel};
pub use error::LoggerError;
pub use format::LoggerFormat;
pub use init::init_logger;
