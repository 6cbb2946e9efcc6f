//! Behaviour both runner variants must share when held as a [`BoxedRunner`].
use std::path::Path;

use bollard::Docker;

use plugrun_core::{BoxedRunner, RunnerError, RunnerState};
use plugrun_model::CommandSpec;
use plugrun_observe::{LoggerConfig, LoggerLevel, init_logger};

use crate::{
    container::{ContainerConfig, ContainerRunner, create_host_socket_dir},
    subprocess::CmdRunner,
};

fn init_logging() {
    let cfg = LoggerConfig {
        level: LoggerLevel::new("plugrun_exec=trace,info").unwrap(),
        use_color: false,
        ..Default::default()
    };
    let _ = init_logger(&cfg);
}

fn runners() -> Vec<(BoxedRunner, &'static str)> {
    // never dialled by these tests
    let docker =
        Docker::connect_with_http("http://127.0.0.1:1", 2, bollard::API_DEFAULT_VERSION).unwrap();

    let cmd = CommandSpec::new("/bin/true");
    let local = CmdRunner::new(cmd.clone()).unwrap();

    let dir = create_host_socket_dir(None, None).unwrap();
    let container =
        ContainerRunner::with_client(docker, &cmd, ContainerConfig::new("plugins/true:1"), dir)
            .unwrap();

    vec![
        (Box::new(local) as BoxedRunner, "/bin/true"),
        (Box::new(container) as BoxedRunner, "plugins/true:1"),
    ]
}

#[tokio::test]
async fn identity_before_start() {
    init_logging();
    for (runner, name) in runners() {
        assert_eq!(runner.name(), name);
        assert_eq!(runner.id(), "");
        assert_eq!(runner.state(), RunnerState::New);
        assert!(runner.stdout().is_none());
        assert!(runner.stderr().is_none());
        runner.kill().await.unwrap();
    }
}

#[tokio::test]
async fn kill_before_start_is_idempotent_and_final() {
    init_logging();
    for (runner, name) in runners() {
        runner.kill().await.unwrap();
        runner.kill().await.unwrap();
        assert_eq!(runner.state(), RunnerState::Dead, "{name}");
        assert_eq!(runner.id(), "", "{name}");
        assert!(
            matches!(runner.start().await, Err(RunnerError::InvalidState { .. })),
            "{name}"
        );
        assert!(
            matches!(runner.wait().await, Err(RunnerError::InvalidState { .. })),
            "{name}"
        );
    }
}

#[tokio::test]
async fn unknown_network_has_same_shape() {
    init_logging();
    for (runner, name) in runners() {
        let err = runner.resolve_addr("udp", "127.0.0.1:53").unwrap_err();
        assert!(
            matches!(err, RunnerError::UnsupportedNetwork { ref network, .. } if network == "udp"),
            "{name}: {err:?}"
        );
        runner.kill().await.unwrap();
    }
}

#[tokio::test]
async fn unix_addresses_resolve_to_paths() {
    init_logging();
    let [(local, _), (container, _)]: [(BoxedRunner, &str); 2] =
        runners().try_into().ok().unwrap();

    let addr = local.resolve_addr("unix", "/run/p/plugin.sock").unwrap();
    assert_eq!(addr.as_unix_path(), Some(Path::new("/run/p/plugin.sock")));

    let addr = container
        .resolve_addr("unix", "PLUGIN_UNIX_SOCKET_DIR:plugin.sock")
        .unwrap();
    let path = addr.as_unix_path().unwrap();
    assert!(path.ends_with("plugin.sock"));
    assert!(path.starts_with(std::env::temp_dir().canonicalize().unwrap()));

    local.kill().await.unwrap();
    container.kill().await.unwrap();
}
