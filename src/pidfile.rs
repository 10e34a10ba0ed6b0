use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process;

use crate::error::{DaemonError, DaemonResult};

/// Writes the calling process's id as a decimal string to `path`, truncating
/// any prior content.
///
/// Must run only after detachment so the recorded id belongs to the final
/// daemon, not an intermediate fork. A failed write is fatal: external
/// tooling signals the daemon through this file.
pub(crate) fn write<P: AsRef<Path>>(path: P) -> DaemonResult<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| DaemonError::Filesystem {
            action: "open pid file",
            path: path.to_path_buf(),
            source,
        })?;

    writeln!(file, "{}", process::id()).map_err(|source| DaemonError::Filesystem {
        action: "write pid file",
        path: path.to_path_buf(),
        source,
    })
}

/// Unlinks the PID file on shutdown. Best-effort: the process is on its way
/// out and has nowhere to report to.
pub(crate) fn remove<P: AsRef<Path>>(path: P) {
    let _ = fs::remove_file(path);
}
