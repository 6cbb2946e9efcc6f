use bollard::models::{
    ContainerCreateBody, Mount, MountBindOptions, MountBindOptionsPropagationEnum, MountTypeEnum,
};
use serde::{Deserialize, Serialize};

use plugrun_model::CONTAINER_SOCKET_DIR;

use crate::ExecError;

/// Container launch configuration supplied by the caller.
///
/// `container` carries the image reference, command and entrypoint overrides,
/// and `host_config` (mounts, network mode, limits) plus `networking_config`,
/// exactly as the engine expects them. The runner only adds the rendezvous
/// mount and replaces the environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerConfig {
    /// Create request forwarded to the engine.
    pub container: ContainerCreateBody,
    /// Group id the plugin should chgrp its socket to; `0` leaves it alone.
    pub unix_socket_group: u32,
}

impl ContainerConfig {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            container: ContainerCreateBody {
                image: Some(image.into()),
                ..Default::default()
            },
            unix_socket_group: 0,
        }
    }

    pub fn with_unix_socket_group(mut self, gid: u32) -> Self {
        self.unix_socket_group = gid;
        self
    }

    /// Image reference, if one is set and non-blank.
    pub fn image(&self) -> Option<&str> {
        self.container
            .image
            .as_deref()
            .filter(|image| !image.trim().is_empty())
    }

    pub fn validate(&self) -> Result<(), ExecError> {
        if self.image().is_none() {
            return Err(ExecError::InvalidRunnerConfig(
                "container image is empty".into(),
            ));
        }
        Ok(())
    }
}

/// Bind mount of the host rendezvous directory onto the container-side socket dir.
///
/// Read-write, shared propagation so mount events cross the boundary, non-recursive.
pub(crate) fn rendezvous_mount(host_socket_dir: &str) -> Mount {
    Mount {
        typ: Some(MountTypeEnum::BIND),
        source: Some(host_socket_dir.to_string()),
        target: Some(CONTAINER_SOCKET_DIR.to_string()),
        read_only: Some(false),
        bind_options: Some(MountBindOptions {
            propagation: Some(MountBindOptionsPropagationEnum::RSHARED),
            non_recursive: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}
