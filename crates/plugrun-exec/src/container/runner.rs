use std::{
    io,
    path::{Path, PathBuf},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bollard::{
    Docker,
    errors::Error as BollardError,
    models::ContainerCreateBody,
    query_parameters::{
        CreateContainerOptions, LogsOptionsBuilder, RemoveContainerOptionsBuilder,
        StartContainerOptions, StopContainerOptions, WaitContainerOptionsBuilder,
    },
};
use futures_util::StreamExt;
use tokio::io::{DuplexStream, duplex};
use tracing::{debug, info, warn};

use plugrun_core::{PluginRunner, PluginStream, RunnerError, RunnerState, StateCell};
use plugrun_model::{
    CONTAINER_SOCKET_DIR, CommandSpec, ENV_UNIX_SOCKET_DIR, ENV_UNIX_SOCKET_GROUP, PluginAddr,
};

use crate::{
    ExecError,
    container::{
        ContainerConfig,
        config::rendezvous_mount,
        demux::{self, PIPE_CAPACITY},
    },
    guard::lock,
};

/// Runner that launches a plugin as a container.
///
/// Owns the host rendezvous directory and the engine client for its whole
/// lifetime; both are released by `kill`, whatever happened before.
pub struct ContainerRunner {
    /// Create request with the rendezvous mount and environment applied.
    body: ContainerCreateBody,
    image: String,
    host_socket_dir: PathBuf,
    /// Engine client; `None` once released.
    docker: Mutex<Option<Docker>>,
    /// Client handle reserved for the single `wait` call.
    waiter: Mutex<Option<Docker>>,
    id: OnceLock<String>,
    stdout: Mutex<Option<DuplexStream>>,
    stderr: Mutex<Option<DuplexStream>>,
    released: AtomicBool,
    state: StateCell,
}

impl ContainerRunner {
    /// Build a runner with an engine client from ambient configuration.
    ///
    /// `DOCKER_HOST` selects a unix socket or a `tcp://`/`http://` endpoint
    /// (TLS when `DOCKER_TLS_VERIFY` is set); unset means the local socket.
    /// The API version is negotiated on the first `start`.
    pub fn new(
        cmd: &CommandSpec,
        config: ContainerConfig,
        host_socket_dir: impl Into<PathBuf>,
    ) -> Result<Self, RunnerError> {
        let docker = Docker::connect_with_defaults().map_err(|e| {
            RunnerError::InvalidConfig(format!("failed to build container engine client: {e}"))
        })?;
        Self::with_client(docker, cmd, config, host_socket_dir)
    }

    /// Build a runner around an existing engine client.
    ///
    /// Only the environment of `cmd` is used; it is copied, never modified.
    pub fn with_client(
        docker: Docker,
        cmd: &CommandSpec,
        config: ContainerConfig,
        host_socket_dir: impl Into<PathBuf>,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        let host_socket_dir = host_socket_dir.into();
        if !host_socket_dir.is_absolute() {
            return Err(ExecError::InvalidRunnerConfig(format!(
                "host socket dir must be absolute: {}",
                host_socket_dir.display()
            ))
            .into());
        }
        let Some(source) = host_socket_dir.to_str() else {
            return Err(ExecError::InvalidRunnerConfig(format!(
                "host socket dir is not valid UTF-8: {}",
                host_socket_dir.display()
            ))
            .into());
        };

        let image = config.image().unwrap_or_default().to_string();
        let ContainerConfig {
            container: mut body,
            unix_socket_group,
        } = config;

        body.host_config
            .get_or_insert_with(Default::default)
            .mounts
            .get_or_insert_with(Vec::new)
            .push(rendezvous_mount(source));

        let mut env = cmd.env.clone();
        env.push(ENV_UNIX_SOCKET_DIR, CONTAINER_SOCKET_DIR);
        if unix_socket_group != 0 {
            env.push(ENV_UNIX_SOCKET_GROUP, unix_socket_group.to_string());
        }
        body.env = Some(env.to_assignments());

        Ok(Self {
            body,
            image,
            host_socket_dir,
            docker: Mutex::new(Some(docker)),
            waiter: Mutex::new(None),
            id: OnceLock::new(),
            stdout: Mutex::new(None),
            stderr: Mutex::new(None),
            released: AtomicBool::new(false),
            state: StateCell::new(),
        })
    }

    /// Create request that `start` sends to the engine.
    pub fn create_body(&self) -> &ContainerCreateBody {
        &self.body
    }

    /// Host side of the rendezvous directory.
    pub fn host_socket_dir(&self) -> &Path {
        &self.host_socket_dir
    }

    fn client(&self, op: &'static str) -> Result<Docker, RunnerError> {
        lock(&self.docker).clone().ok_or(RunnerError::InvalidState {
            op,
            state: self.state.get(),
        })
    }

    /// Create, start and attach. `created` receives the client and container id as soon as the container exists.
    async fn launch(&self, created: &mut Option<(Docker, String)>) -> Result<(), ExecError> {
        let docker = self
            .client("start")
            .map_err(|e| ExecError::InvalidRunnerConfig(e.to_string()))?
            .negotiate_version()
            .await
            .map_err(|source| ExecError::Engine {
                op: "negotiate_version",
                source,
            })?;
        if let Some(slot) = lock(&self.docker).as_mut() {
            *slot = docker.clone();
        }

        debug!(image = %self.image, "creating plugin container");
        let resp = docker
            .create_container(None::<CreateContainerOptions>, self.body.clone())
            .await
            .map_err(|source| ExecError::Engine {
                op: "create_container",
                source,
            })?;
        let id = resp.id;
        *created = Some((docker.clone(), id.clone()));

        docker
            .start_container(&id, None::<StartContainerOptions>)
            .await
            .map_err(|source| ExecError::Engine {
                op: "start_container",
                source,
            })?;

        let (stdout_w, stdout_r) = duplex(PIPE_CAPACITY);
        let (stderr_w, stderr_r) = duplex(PIPE_CAPACITY);
        *lock(&self.stdout) = Some(stdout_r);
        *lock(&self.stderr) = Some(stderr_r);
        *lock(&self.waiter) = Some(docker.clone());
        let _ = self.id.set(id.clone());

        tokio::spawn(async move {
            let opts = LogsOptionsBuilder::new()
                .follow(true)
                .stdout(true)
                .stderr(true)
                .build();
            let logs = docker.logs(&id, Some(opts));
            demux::pump(&id, logs, stdout_w, stderr_w).await;
        });

        debug!(image = %self.image, id = self.id(), "plugin container started");
        Ok(())
    }

    /// Best-effort removal of a container whose launch did not complete.
    async fn discard(docker: &Docker, id: &str) {
        let opts = RemoveContainerOptionsBuilder::new().force(true).build();
        if let Err(e) = docker.remove_container(id, Some(opts)).await {
            warn!(id, "failed to remove container after failed launch: {e}");
        }
    }

    async fn stop(&self) -> Result<(), RunnerError> {
        let id = self.id();
        let Ok(docker) = self.client("kill") else {
            return Ok(());
        };
        match docker.stop_container(id, None::<StopContainerOptions>).await {
            Ok(()) => Ok(()),
            // already stopped or already gone
            Err(BollardError::DockerResponseServerError {
                status_code: 304 | 404,
                ..
            }) => Ok(()),
            Err(e) => {
                warn!(id, "failed to stop plugin container: {e}");
                Err(RunnerError::Cleanup(format!("stop container {id}: {e}")))
            }
        }
    }

    /// Drop the engine client and remove the rendezvous directory. Runs once.
    async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        lock(&self.docker).take();
        match tokio::fs::remove_dir_all(&self.host_socket_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                dir = %self.host_socket_dir.display(),
                "failed to remove host socket dir: {e}"
            ),
        }
    }
}

#[async_trait]
impl PluginRunner for ContainerRunner {
    async fn start(&self) -> Result<(), RunnerError> {
        let state = self.state.get();
        if state != RunnerState::New {
            return Err(RunnerError::InvalidState { op: "start", state });
        }

        let mut created = None;
        let launched = self.launch(&mut created).await;
        let outcome = match launched {
            Ok(()) => self
                .state
                .transition(&[RunnerState::New], RunnerState::Running)
                .map(|_| ())
                .map_err(|state| {
                    RunnerError::Launch(format!(
                        "runner moved to {state} while the container was starting"
                    ))
                }),
            Err(e) => Err(RunnerError::Launch(e.to_string())),
        };

        if let Err(e) = outcome {
            if let Some((docker, id)) = created.as_ref() {
                Self::discard(docker, id).await;
            }
            self.state.set(RunnerState::Dead);
            self.release().await;
            return Err(e);
        }
        Ok(())
    }

    async fn wait(&self) -> Result<(), RunnerError> {
        let state = self.state.get();
        if !matches!(state, RunnerState::Running | RunnerState::Stopping) {
            return Err(RunnerError::InvalidState { op: "wait", state });
        }
        let Some(docker) = lock(&self.waiter).take() else {
            return Err(RunnerError::InvalidState { op: "wait", state });
        };

        let id = self.id();
        let opts = WaitContainerOptionsBuilder::new()
            .condition("not-running")
            .build();
        let mut statuses = std::pin::pin!(docker.wait_container(id, Some(opts)));

        let outcome = match statuses.next().await {
            Some(Ok(status)) => {
                info!(id, status_code = status.status_code, "received status update");
                exit_result(status.status_code, status.error.and_then(|e| e.message))
            }
            // non-zero exits arrive as errors carrying the code
            Some(Err(BollardError::DockerContainerWaitError { error, code })) => {
                info!(id, status_code = code, "received status update");
                exit_result(code, Some(error))
            }
            Some(Err(e)) => return Err(RunnerError::Supervisor(e.to_string())),
            None => {
                return Err(RunnerError::Supervisor(
                    "wait stream ended without a status".into(),
                ));
            }
        };

        self.state.set(RunnerState::Exited);
        outcome
    }

    async fn kill(&self) -> Result<(), RunnerError> {
        if self
            .state
            .transition(&[RunnerState::New], RunnerState::Dead)
            .is_ok()
        {
            self.release().await;
            return Ok(());
        }

        let stopped = match self
            .state
            .transition(&[RunnerState::Running], RunnerState::Stopping)
        {
            Ok(_) => {
                debug!(id = self.id(), "stopping plugin container");
                self.stop().await
            }
            Err(_) => Ok(()),
        };
        self.release().await;
        stopped
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
        crate::resolve_container_addr(&self.host_socket_dir, network, address)
    }

    fn name(&self) -> &str {
        &self.image
    }

    fn id(&self) -> &str {
        self.id.get().map(String::as_str).unwrap_or("")
    }

    fn state(&self) -> RunnerState {
        self.state.get()
    }
}

/// An engine-reported message wins over the status code.
fn exit_result(code: i64, message: Option<String>) -> Result<(), RunnerError> {
    match message.filter(|m| !m.is_empty()) {
        Some(message) => Err(RunnerError::Abnormal(message)),
        None if code != 0 => Err(RunnerError::Exited { code }),
        None => Ok(()),
    }
}
