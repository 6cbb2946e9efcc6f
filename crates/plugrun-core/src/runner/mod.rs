//! Runner contract shared by every plugin launcher.
//!
//! A runner owns one plugin workload (child process or container): it starts it,
//! exposes its output streams, waits for it, kills it and tells the caller where
//! to dial it.
mod error;
pub use error::RunnerError;

mod state;
pub use state::{RunnerState, StateCell};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use plugrun_model::PluginAddr;

/// Readable end of a plugin output stream. Reaches EOF once the workload is gone.
pub type PluginStream = Box<dyn AsyncRead + Send + Unpin>;

/// Abstract handle callers keep for a plugin, whatever launched it.
pub type BoxedRunner = Box<dyn PluginRunner>;

/// Uniform lifecycle over a plugin workload.
///
/// All operations take `&self`: `kill` may be issued from any task at any time,
/// including while another task is parked in `wait`.
///
/// Call order:
/// - `start` at most once;
/// - `wait` at most once, only after a successful `start`;
/// - `kill` any number of times, before or after `start`.
#[async_trait]
pub trait PluginRunner: Send + Sync {
    /// Launch the workload. Returns once it is running or launch has failed.
    async fn start(&self) -> Result<(), RunnerError>;

    /// Block until the workload terminates.
    ///
    /// Abnormal termination (non-zero exit, signal, supervisor-reported error) is an `Err`.
    async fn wait(&self) -> Result<(), RunnerError>;

    /// Request termination and release owned resources. Idempotent.
    async fn kill(&self) -> Result<(), RunnerError>;

    /// Take the plugin's stdout. `None` before `start` or once taken.
    fn stdout(&self) -> Option<PluginStream>;

    /// Take the plugin's stderr. `None` before `start` or once taken.
    fn stderr(&self) -> Option<PluginStream>;

    /// Turn an address advertised by the plugin into one the host can dial.
    fn resolve_addr(&self, network: &str, address: &str) -> Result<PluginAddr, RunnerError>;

    /// Human-readable identity: executable path or image reference.
    fn name(&self) -> &str;

    /// Machine identity: pid or container id. Empty until `start` succeeds.
    fn id(&self) -> &str;

    fn state(&self) -> RunnerState;
}
