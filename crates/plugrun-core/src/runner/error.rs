use thiserror::Error;

use plugrun_model::ModelError;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid runner configuration: {0}")]
    InvalidConfig(String),

    #[error("launch failed: {0}")]
    Launch(String),

    #[error("supervisor error: {0}")]
    Supervisor(String),

    #[error("plugin exited with non-zero code: {code}")]
    Exited { code: i64 },

    #[error("plugin terminated by signal {signal}")]
    Signaled { signal: i32 },

    #[error("plugin terminated abnormally: {0}")]
    Abnormal(String),

    #[error("unknown address type: {network}, {address}")]
    UnsupportedNetwork { network: String, address: String },

    #[error("malformed address '{address}': {reason}")]
    MalformedAddress { address: String, reason: String },

    #[error("plugin is running inside container but needs an update to be compatible")]
    IncompatiblePlugin,

    #[error("operation '{op}' is not valid in state {state}")]
    InvalidState { op: &'static str, state: super::RunnerState },

    #[error("cleanup failed: {0}")]
    Cleanup(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for RunnerError {
    fn from(e: std::io::Error) -> Self {
        RunnerError::Io(e.to_string())
    }
}

impl From<ModelError> for RunnerError {
    fn from(e: ModelError) -> Self {
        RunnerError::InvalidConfig(e.to_string())
    }
}
