use std::{
    fs::{self, DirBuilder, Permissions},
    os::unix::fs::{DirBuilderExt, PermissionsExt, chown},
    path::{Path, PathBuf},
};

use tracing::debug;
use uuid::Uuid;

use crate::ExecError;

/// Create a fresh host rendezvous directory for one container runner.
///
/// The directory is created under `base` (the system temp dir when `None`)
/// with a unique name, mode `0700`; when `group` is given it is chgrp'ed to
/// that group and opened up to `0770` so a plugin running as a different
/// user in the same group can create its socket there.
///
/// The returned path is absolute, as bind mounts require.
pub fn create_host_socket_dir(base: Option<&Path>, group: Option<u32>) -> Result<PathBuf, ExecError> {
    let base = base.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
    let dir = base.join(format!("plugin-dir-{}", Uuid::new_v4().simple()));

    DirBuilder::new().mode(0o700).create(&dir)?;
    if let Some(gid) = group {
        chown(&dir, None, Some(gid))?;
        fs::set_permissions(&dir, Permissions::from_mode(0o770))?;
    }

    let dir = dir.canonicalize()?;
    debug!(dir = %dir.display(), group = ?group, "created host socket dir");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_unique_private_dirs() {
        let a = create_host_socket_dir(None, None).unwrap();
        let b = create_host_socket_dir(None, None).unwrap();

        assert_ne!(a, b);
        assert!(a.is_absolute());
        assert!(a.is_dir());
        let mode = fs::metadata(&a).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o700);

        fs::remove_dir_all(&a).unwrap();
        fs::remove_dir_all(&b).unwrap();
    }

    #[test]
    fn group_opens_dir_to_group() {
        let gid = unsafe { libc::getegid() };
        let dir = create_host_socket_dir(None, Some(gid)).unwrap();

        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o770);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_base_is_io_error() {
        let err = create_host_socket_dir(Some(Path::new("/nonexistent/base/dir")), None)
            .unwrap_err();
        assert!(matches!(err, ExecError::Io(_)));
    }
}
