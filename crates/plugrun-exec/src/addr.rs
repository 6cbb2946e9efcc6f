//! Resolution of plugin-advertised addresses into dialable ones.
use std::{
    net::ToSocketAddrs,
    path::{Component, Path, PathBuf},
};

use plugrun_core::RunnerError;
use plugrun_model::{Network, PluginAddr, SOCKET_DIR_SENTINEL};

/// Resolve an address advertised by a plugin running on the host.
///
/// `tcp` addresses go through the system resolver and the first result wins;
/// `unix` addresses are taken as filesystem paths verbatim.
pub fn resolve_host_addr(network: &str, address: &str) -> Result<PluginAddr, RunnerError> {
    match network.parse::<Network>() {
        Ok(Network::Tcp) => resolve_tcp(address),
        Ok(Network::Unix) => resolve_unix(address),
        Err(_) => Err(unknown_network(network, address)),
    }
}

/// Resolve an address advertised by a plugin running inside a container.
///
/// Only `unix` is supported. The plugin does not know where its socket lives on
/// the host, so it announces `PLUGIN_UNIX_SOCKET_DIR:<relative>` and the
/// remainder is joined onto `host_socket_dir`.
pub fn resolve_container_addr(
    host_socket_dir: &Path,
    network: &str,
    address: &str,
) -> Result<PluginAddr, RunnerError> {
    match network.parse::<Network>() {
        Ok(Network::Unix) => {
            let relative = address
                .strip_prefix(SOCKET_DIR_SENTINEL)
                .ok_or(RunnerError::IncompatiblePlugin)?;
            let relative = clean_relative(address, relative)?;
            Ok(PluginAddr::Unix(host_socket_dir.join(relative)))
        }
        _ => Err(unknown_network(network, address)),
    }
}

fn resolve_tcp(address: &str) -> Result<PluginAddr, RunnerError> {
    let mut addrs = address
        .to_socket_addrs()
        .map_err(|e| malformed(address, e.to_string()))?;
    addrs
        .next()
        .map(PluginAddr::Tcp)
        .ok_or_else(|| malformed(address, "no addresses resolved".into()))
}

fn resolve_unix(address: &str) -> Result<PluginAddr, RunnerError> {
    if address.is_empty() {
        return Err(malformed(address, "empty socket path".into()));
    }
    Ok(PluginAddr::Unix(PathBuf::from(address)))
}

/// Normalize the part after the sentinel into a path that stays inside the rendezvous dir.
///
/// Leading `/` and `.` components are dropped; `..` is refused.
fn clean_relative(address: &str, relative: &str) -> Result<PathBuf, RunnerError> {
    let mut out = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir | Component::Prefix(_) => {
                return Err(malformed(
                    address,
                    "socket path escapes the rendezvous directory".into(),
                ));
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(malformed(address, "empty socket path".into()));
    }
    Ok(out)
}

fn unknown_network(network: &str, address: &str) -> RunnerError {
    RunnerError::UnsupportedNetwork {
        network: network.to_string(),
        address: address.to_string(),
    }
}

fn malformed(address: &str, reason: String) -> RunnerError {
    RunnerError::MalformedAddress {
        address: address.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_tcp_parses_socket_addr() {
        let addr = resolve_host_addr("tcp", "127.0.0.1:1234").unwrap();
        assert_eq!(addr, PluginAddr::Tcp("127.0.0.1:1234".parse().unwrap()));
    }

    #[test]
    fn host_tcp_rejects_garbage() {
        let err = resolve_host_addr("tcp", "not an address").unwrap_err();
        assert!(matches!(err, RunnerError::MalformedAddress { .. }));
    }

    #[test]
    fn host_unix_keeps_path() {
        let addr = resolve_host_addr("unix", "/run/plugin/plugin.sock").unwrap();
        assert_eq!(addr, PluginAddr::Unix("/run/plugin/plugin.sock".into()));
        assert!(resolve_host_addr("unix", "").is_err());
    }

    #[test]
    fn host_rejects_unknown_network() {
        let err = resolve_host_addr("udp", "127.0.0.1:53").unwrap_err();
        assert!(matches!(err, RunnerError::UnsupportedNetwork { .. }));
        assert!(err.to_string().contains("unknown address type"));
    }

    #[test]
    fn container_rewrites_sentinel_address() {
        let addr =
            resolve_container_addr(Path::new("/tmp/abc"), "unix", "PLUGIN_UNIX_SOCKET_DIR:plugin.sock")
                .unwrap();
        assert_eq!(addr.as_unix_path(), Some(Path::new("/tmp/abc/plugin.sock")));
    }

    #[test]
    fn container_rewrite_matches_join_for_any_basename() {
        let host = Path::new("/var/run/plugins/xyz");
        for base in ["a.sock", "plugin-123.sock", "nested/dir/p.sock", "x"] {
            let addr = resolve_container_addr(host, "unix", &format!("{SOCKET_DIR_SENTINEL}{base}"))
                .unwrap();
            assert_eq!(
                addr.as_unix_path().unwrap(),
                Path::new(&format!("/var/run/plugins/xyz/{base}"))
            );
        }
    }

    #[test]
    fn container_cleans_leading_slash_and_dots() {
        let addr = resolve_container_addr(
            Path::new("/tmp/abc"),
            "unix",
            "PLUGIN_UNIX_SOCKET_DIR:/./plugin.sock",
        )
        .unwrap();
        assert_eq!(addr.as_unix_path(), Some(Path::new("/tmp/abc/plugin.sock")));
    }

    #[test]
    fn container_rejects_plain_path() {
        let err = resolve_container_addr(Path::new("/tmp/abc"), "unix", "/tmp/plugin.sock")
            .unwrap_err();
        assert!(matches!(err, RunnerError::IncompatiblePlugin));
        assert!(err.to_string().contains("needs an update"));
    }

    #[test]
    fn container_rejects_escape_and_empty() {
        let host = Path::new("/tmp/abc");
        for bad in ["PLUGIN_UNIX_SOCKET_DIR:../etc/x.sock", "PLUGIN_UNIX_SOCKET_DIR:", "PLUGIN_UNIX_SOCKET_DIR:/"] {
            let err = resolve_container_addr(host, "unix", bad).unwrap_err();
            assert!(
                matches!(err, RunnerError::MalformedAddress { .. }),
                "expected malformed for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn container_rejects_tcp() {
        let err = resolve_container_addr(Path::new("/tmp/abc"), "tcp", "127.0.0.1:1234")
            .unwrap_err();
        assert!(matches!(err, RunnerError::UnsupportedNetwork { .. }));
    }
}
