mod kv;
pub use kv::KeyValue;

mod env;
pub use env::Env;

mod flag;
pub use flag::Flag;

mod constants;
pub use constants::{
    CONTAINER_SOCKET_DIR, ENV_UNIX_SOCKET_DIR, ENV_UNIX_SOCKET_GROUP, SOCKET_DIR_SENTINEL,
};
