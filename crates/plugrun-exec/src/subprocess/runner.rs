use std::{
    io,
    process::{ExitStatus, Stdio},
    sync::{Mutex, OnceLock},
};

use async_trait::async_trait;
use tokio::{
    process::{Child, ChildStderr, ChildStdout, Command},
    sync::oneshot,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use plugrun_core::{PluginRunner, PluginStream, RunnerError, RunnerState, StateCell};
use plugrun_model::{CommandSpec, PluginAddr};

use crate::guard::lock;

/// Runner that launches a plugin as a child of the host process.
///
/// Output pipes are configured at construction and become available once the
/// child is spawned. The executable path and pid are snapshotted so identity
/// survives after the OS forgets the process.
///
/// After spawn the child is owned by a reaper task that waits for it and
/// delivers SIGKILL when `kill` fires, so `kill` never has to contend with a
/// parked `wait`. Dropping the runner kills a still-running plugin.
pub struct CmdRunner {
    /// Descriptor the command was built from.
    spec: CommandSpec,
    /// Prepared command; consumed by `start`.
    command: Mutex<Option<Command>>,
    stdout: Mutex<Option<ChildStdout>>,
    stderr: Mutex<Option<ChildStderr>>,
    /// Exit status published by the reaper; consumed by `wait`.
    exit: Mutex<Option<oneshot::Receiver<io::Result<ExitStatus>>>>,
    pid: OnceLock<String>,
    state: StateCell,
    kill: CancellationToken,
}

impl CmdRunner {
    /// Prepare a runner for a command that has not been started yet.
    pub fn new(spec: CommandSpec) -> Result<Self, RunnerError> {
        spec.validate()?;

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if spec.inherit_env.is_disabled() {
            cmd.env_clear();
        }
        for kv in spec.env.iter() {
            cmd.env(kv.key(), kv.value());
        }
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        Ok(Self {
            spec,
            command: Mutex::new(Some(cmd)),
            stdout: Mutex::new(None),
            stderr: Mutex::new(None),
            exit: Mutex::new(None),
            pid: OnceLock::new(),
            state: StateCell::new(),
            kill: CancellationToken::new(),
        })
    }

    /// Descriptor this runner was built from.
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Spawn `cmd` and hand the child to a reaper. Identity and streams are
    /// published only once the runner is `Running`.
    fn launch(&self, mut cmd: Command) -> Result<(), RunnerError> {
        debug!(path = %self.spec.program, args = ?self.spec.args, "starting plugin");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state.set(RunnerState::Dead);
                return Err(RunnerError::Launch(format!("spawn failed: {e}")));
            }
        };

        if let Err(state) = self.state.transition(&[RunnerState::New], RunnerState::Running) {
            // killed while spawning; kill_on_drop finishes the job
            let _ = child.start_kill();
            return Err(RunnerError::Launch(format!(
                "runner moved to {state} while the plugin was starting"
            )));
        }

        let pid = child.id().map(|pid| pid.to_string()).unwrap_or_default();
        let _ = self.pid.set(pid.clone());
        *lock(&self.stdout) = child.stdout.take();
        *lock(&self.stderr) = child.stderr.take();

        let (tx, rx) = oneshot::channel();
        *lock(&self.exit) = Some(rx);
        tokio::spawn(reap(child, self.kill.clone(), pid, tx));

        debug!(path = %self.spec.program, pid = self.id(), "plugin started");
        Ok(())
    }
}

impl Drop for CmdRunner {
    fn drop(&mut self) {
        self.kill.cancel();
    }
}

/// Own the child until it exits, killing it first if `kill` fires.
async fn reap(
    mut child: Child,
    kill: CancellationToken,
    pid: String,
    tx: oneshot::Sender<io::Result<ExitStatus>>,
) {
    let status = tokio::select! {
        res = child.wait() => res,
        _ = kill.cancelled() => {
            trace!(pid = %pid, "kill requested; signalling plugin");
            if let Err(e) = child.start_kill() {
                debug!(pid = %pid, "failed to signal plugin: {e}");
            }
            child.wait().await
        }
    };
    let _ = tx.send(status);
}

#[async_trait]
impl PluginRunner for CmdRunner {
    async fn start(&self) -> Result<(), RunnerError> {
        let state = self.state.get();
        if state != RunnerState::New {
            return Err(RunnerError::InvalidState { op: "start", state });
        }
        let Some(cmd) = lock(&self.command).take() else {
            return Err(RunnerError::InvalidState { op: "start", state });
        };
        self.launch(cmd)
    }

    async fn wait(&self) -> Result<(), RunnerError> {
        let state = self.state.get();
        if !matches!(state, RunnerState::Running | RunnerState::Stopping) {
            return Err(RunnerError::InvalidState { op: "wait", state });
        }
        let Some(exit) = lock(&self.exit).take() else {
            return Err(RunnerError::InvalidState { op: "wait", state });
        };

        let status = exit
            .await
            .map_err(|_| RunnerError::Supervisor("reaper task ended without a status".into()))?
            .map_err(|e| RunnerError::Supervisor(format!("wait failed: {e}")))?;

        self.state.set(RunnerState::Exited);
        debug!(path = %self.spec.program, pid = self.id(), %status, "plugin exited");
        exit_result(status)
    }

    async fn kill(&self) -> Result<(), RunnerError> {
        if self
            .state
            .transition(&[RunnerState::New], RunnerState::Dead)
            .is_ok()
        {
            lock(&self.command).take();
            return Ok(());
        }
        if self
            .state
            .transition(&[RunnerState::Running], RunnerState::Stopping)
            .is_ok()
        {
            debug!(path = %self.spec.program, pid = self.id(), "killing plugin");
            self.kill.cancel();
        }
        Ok(())
    }

    fn stdout(&self) -> Option<PluginStream> {
        lock(&self.stdout)
            .take()
            .map(|s| Box::new(s) as PluginStream)
    }

    fn stderr(&self) -> Option<PluginStream> {
        lock(&self.stderr)
            .take()
            .map(|s| Box::new(s) as PluginStream)
    }

    fn resolve_addr(&self, network: &str, address: &str) -> Result<PluginAddr, RunnerError> {
        crate::resolve_host_addr(network, address)
    }

    fn name(&self) -> &str {
        &self.spec.program
    }

    fn id(&self) -> &str {
        self.pid.get().map(String::as_str).unwrap_or("")
    }

    fn state(&self) -> RunnerState {
        self.state.get()
    }
}

/// Map an exit status onto the runner's success/failure shape.
fn exit_result(status: ExitStatus) -> Result<(), RunnerError> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(RunnerError::Exited { code: code.into() });
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(RunnerError::Signaled { signal });
        }
    }
    Err(RunnerError::Abnormal(format!("plugin terminated: {status}")))
}
