//! Plugin runner backed by a container.
//!
//! The host rendezvous directory is bind-mounted at
//! [`plugrun_model::CONTAINER_SOCKET_DIR`] so the plugin's Unix socket is
//! reachable from both sides; the engine's combined log stream is split back
//! into stdout and stderr by a background task.
mod config;
mod demux;
mod rendezvous;
mod runner;

pub use config::ContainerConfig;
pub use rendezvous::create_host_socket_dir;
pub use runner::ContainerRunner;
