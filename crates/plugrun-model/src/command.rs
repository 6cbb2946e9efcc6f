use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Env, Flag, ModelError};

/// Prepared, not-yet-started plugin command.
///
/// The local runner spawns it directly; the container runner only takes the
/// environment from it and leaves entrypoint and arguments to the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    /// Executable path or name (e.g. `"/bin/sh"`).
    pub program: String,
    /// Arguments, not including the program itself.
    #[serde(default)]
    pub args: Vec<String>,
    /// Variables passed to the plugin on top of (or instead of) the parent environment.
    #[serde(default)]
    pub env: Env,
    /// Working directory; `None` inherits the parent's.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Whether the parent environment is inherited before `env` is applied.
    #[serde(default)]
    pub inherit_env: Flag,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Env::new(),
            cwd: None,
            inherit_env: Flag::enabled(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(key, value);
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit.into();
        self
    }

    /// Rules:
    /// - `program` is not empty or whitespace-only.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.program.trim().is_empty() {
            return Err(ModelError::Invalid("command program is empty".into()));
        }
        Ok(())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CommandSpec(program='{}', args={}, env={}, cwd={:?})",
            self.program,
            self.args.len(),
            self.env.len(),
            self.cwd,
        )
    }
}
