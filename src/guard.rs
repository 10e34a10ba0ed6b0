use std::path::PathBuf;

use crate::lock::LockFile;
use crate::pidfile;
use crate::sys;

/// Teardown guard for the running daemon: holds the singleton lock, the PID
/// file path, and the caller's cleanup closure.
///
/// This is the single exit path. Whether the daemon finishes normally via
/// [`exit`](DaemonHandle::exit), returns an error mid-setup, or simply drops
/// the handle, teardown runs exactly once: the cleanup closure first, then
/// lock release, then PID file removal.
pub struct DaemonHandle {
    lock: Option<LockFile>,
    pid_file: Option<PathBuf>,
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl DaemonHandle {
    pub(crate) fn new(
        lock: Option<LockFile>,
        pid_file: Option<PathBuf>,
        cleanup: Option<Box<dyn FnOnce()>>,
    ) -> Self {
        DaemonHandle {
            lock,
            pid_file,
            cleanup,
        }
    }

    /// Runs teardown and terminates the process with `status`.
    ///
    /// Termination is immediate (`_exit`); no destructors or atexit handlers
    /// run beyond what the OS itself performs.
    pub fn exit(mut self, status: i32) -> ! {
        self.teardown();
        sys::exit_now(status)
    }

    // Every step takes its state, so a second pass is a no-op.
    fn teardown(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
        if let Some(path) = self.pid_file.take() {
            pidfile::remove(&path);
        }
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for DaemonHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonHandle")
            .field("lock", &self.lock)
            .field("pid_file", &self.pid_file)
            .field(
                "cleanup",
                &if self.cleanup.is_some() {
                    "Some(FnOnce)"
                } else {
                    "None"
                },
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs::{self, File};
    use std::rc::Rc;

    #[test]
    fn drop_runs_cleanup_once() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);

        let handle = DaemonHandle::new(
            None,
            None,
            Some(Box::new(move || seen.set(seen.get() + 1))),
        );
        drop(handle);

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn drop_releases_lock_and_unlinks_pid_file() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("app.lock");
        let pid_path = dir.path().join("app.pid");
        File::create(&lock_path).unwrap();
        fs::write(&pid_path, "1234\n").unwrap();

        let lock = LockFile::acquire(&lock_path).unwrap();
        drop(DaemonHandle::new(Some(lock), Some(pid_path.clone()), None));

        // a fresh holder can take the lock again
        LockFile::acquire(&lock_path).unwrap();
        assert!(!pid_path.exists());
    }

    #[test]
    fn missing_pid_file_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        drop(DaemonHandle::new(
            None,
            Some(dir.path().join("never-written.pid")),
            None,
        ));
    }
}
