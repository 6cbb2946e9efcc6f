use std::{
    fmt,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Transport family a plugin advertises in its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Tcp,
    Unix,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Unix => "unix",
        }
    }
}

impl FromStr for Network {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "unix" => Ok(Network::Unix),
            other => Err(ModelError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dialable address of a running plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PluginAddr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

impl PluginAddr {
    pub fn network(&self) -> Network {
        match self {
            PluginAddr::Tcp(_) => Network::Tcp,
            PluginAddr::Unix(_) => Network::Unix,
        }
    }

    /// Socket path for Unix addresses.
    pub fn as_unix_path(&self) -> Option<&Path> {
        match self {
            PluginAddr::Unix(path) => Some(path),
            PluginAddr::Tcp(_) => None,
        }
    }

    pub fn as_socket_addr(&self) -> Option<SocketAddr> {
        match self {
            PluginAddr::Tcp(addr) => Some(*addr),
            PluginAddr::Unix(_) => None,
        }
    }
}

impl fmt::Display for PluginAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginAddr::Tcp(addr) => write!(f, "{addr}"),
            PluginAddr::Unix(path) => write!(f, "{}", path.display()),
        }
    }
}
