pub mod runner;

pub use runner::{BoxedRunner, PluginRunner, PluginStream, RunnerError, RunnerState, StateCell};

pub mod prelude {
    pub use crate::runner::{BoxedRunner, PluginRunner, PluginStream, RunnerError, RunnerState};
    pub use plugrun_model::{CommandSpec, Env, Network, PluginAddr};
}
