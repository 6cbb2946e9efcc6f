mod domain;
pub use domain::{
    CONTAINER_SOCKET_DIR, ENV_UNIX_SOCKET_DIR, ENV_UNIX_SOCKET_GROUP, SOCKET_DIR_SENTINEL,
};
pub use domain::{Env, Flag, KeyValue};

mod error;
pub use error::ModelError;

mod command;
pub use command::CommandSpec;

mod addr;
pub use addr::{Network, PluginAddr};
