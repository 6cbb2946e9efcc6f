use thiserror::Error;

use plugrun_core::RunnerError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid runner configuration: {0}")]
    InvalidRunnerConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "container")]
    #[error("container engine error during {op}: {source}")]
    Engine {
        op: &'static str,
        #[source]
        source: bollard::errors::Error,
    },
}

impl From<ExecError> for RunnerError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::InvalidRunnerConfig(msg) => RunnerError::InvalidConfig(msg),
            ExecError::Io(e) => RunnerError::Io(e.to_string()),
            #[cfg(feature = "container")]
            e @ ExecError::Engine { .. } => RunnerError::Supervisor(e.to_string()),
        }
    }
}
