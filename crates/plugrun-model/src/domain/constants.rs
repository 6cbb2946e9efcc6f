//! Well-known names shared between a runner and the plugin it launches.
//!
//! A plugin reads these variables from its environment to learn where its
//! Unix socket must live, and uses the sentinel when announcing the socket
//! from inside a container.

/// Environment variable naming the directory where the plugin creates its Unix socket.
pub const ENV_UNIX_SOCKET_DIR: &str = "PLUGIN_UNIX_SOCKET_DIR";

/// Environment variable carrying the numeric group id the plugin should chgrp its socket to.
///
/// Only injected when the configured group is non-zero.
pub const ENV_UNIX_SOCKET_GROUP: &str = "PLUGIN_UNIX_SOCKET_GROUP";

/// Prefix a containerized plugin prepends to its advertised socket path.
///
/// Everything after the prefix is relative to [`CONTAINER_SOCKET_DIR`].
pub const SOCKET_DIR_SENTINEL: &str = "PLUGIN_UNIX_SOCKET_DIR:";

/// Container-side bind target of the host rendezvous directory.
pub const CONTAINER_SOCKET_DIR: &str = "/tmp";
