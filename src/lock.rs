use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{DaemonError, DaemonResult};

/// Exclusive advisory lock on the configured lock file, held for the
/// daemon's lifetime to keep it a singleton.
///
/// The file must already exist; this type never creates it. Dropping the
/// handle closes the descriptor, which releases the lock only once no forked
/// child still shares the open file description — so the parent branch of
/// the first fork can simply drop its copy while the daemon keeps the lock.
#[derive(Debug)]
pub struct LockFile {
    file: File,
    path: PathBuf,
}

impl LockFile {
    /// Opens `path` read-only and takes a non-blocking exclusive lock.
    ///
    /// Contention is not transient here: a second instance at startup is a
    /// configuration conflict, so there is no retry.
    pub fn acquire<P: AsRef<Path>>(path: P) -> DaemonResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|source| DaemonError::LockUnavailable {
                path: path.clone(),
                source,
            })?;

        if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } != 0 {
            let err = io::Error::last_os_error();
            return Err(if err.kind() == io::ErrorKind::WouldBlock {
                DaemonError::LockHeld { path }
            } else {
                DaemonError::Syscall {
                    call: "flock",
                    errno: err.raw_os_error().unwrap_or(0),
                }
            });
        }

        debug!("acquired singleton lock on {}", path.display());
        Ok(LockFile { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicitly unlocks and closes the handle. Used by the teardown guard
    /// so the lock is released even if a forked relative still shares the
    /// file description.
    pub(crate) fn release(self) {
        if unsafe { libc::flock(self.file.as_raw_fd(), libc::LOCK_UN) } != 0 {
            eprintln!("can't unlock the lock file {}", self.path.display());
        }
        // file closes on drop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_target() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.lock");
        File::create(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn acquires_unlocked_file() {
        let (_dir, path) = lock_target();
        let lock = LockFile::acquire(&path).unwrap();
        assert_eq!(lock.path(), path.as_path());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        match LockFile::acquire(dir.path().join("nope.lock")) {
            Err(DaemonError::LockUnavailable { .. }) => {}
            other => panic!("expected LockUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn contended_file_reports_held() {
        let (_dir, path) = lock_target();
        let _held = LockFile::acquire(&path).unwrap();
        match LockFile::acquire(&path) {
            Err(DaemonError::LockHeld { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected LockHeld, got {:?}", other),
        }
    }

    #[test]
    fn release_allows_reacquisition() {
        let (_dir, path) = lock_target();
        let lock = LockFile::acquire(&path).unwrap();
        lock.release();
        LockFile::acquire(&path).unwrap();
    }

    #[test]
    fn drop_allows_reacquisition() {
        let (_dir, path) = lock_target();
        drop(LockFile::acquire(&path).unwrap());
        LockFile::acquire(&path).unwrap();
    }
}
