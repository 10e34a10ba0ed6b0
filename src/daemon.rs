use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use log::debug;

#[cfg(target_os = "linux")]
use sd_notify::NotifyState;

use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::guard::DaemonHandle;
use crate::lock::LockFile;
use crate::pidfile;
use crate::stdio::{STDERR_SLOT, STDIN_SLOT, STDOUT_SLOT, Stdio, StreamSlot};
use crate::sys::{self, ForkOutcome};

/// Outcome of [`Daemon::launch`].
#[must_use = "the parent branch must exit, the daemon branch owns the teardown guard"]
pub enum Launch {
    /// Still the original foreground process. The detached child (pid
    /// `child`) carries on; the caller is expected to exit now.
    Parent { child: i32 },
    /// The final detached process. Dropping the handle (or calling
    /// [`DaemonHandle::exit`]) releases the lock and removes the PID file.
    Daemon(DaemonHandle),
}

/// Entry point: couples a validated [`DaemonConfig`] with an optional
/// cleanup closure and performs the daemonization sequence.
pub struct Daemon {
    config: DaemonConfig,
    cleanup: Option<Box<dyn FnOnce()>>,
}

impl Daemon {
    pub fn new(config: DaemonConfig) -> Self {
        Daemon {
            config,
            cleanup: None,
        }
    }

    /// Registers a cleanup closure, run exactly once before the process
    /// goes away, on normal shutdown and on every fatal path alike.
    ///
    /// The closure must not re-enter the exit path itself.
    pub fn on_exit<F: FnOnce() + 'static>(mut self, cleanup: F) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }

    /// Runs the daemonization sequence: validate, lock, detach, chdir,
    /// redirect stdio, relax the core limit, persist the PID.
    ///
    /// In the original caller this returns [`Launch::Parent`] right after
    /// the first fork; everything past that point happens in the detached
    /// child, which gets [`Launch::Daemon`]. With `as_daemon` false the
    /// forks are skipped but every other step still runs.
    pub fn launch(self) -> DaemonResult<Launch> {
        self.config.validate()?;

        let lock = match self.config.lock_file_path() {
            Some(path) => Some(LockFile::acquire(path)?),
            None => None,
        };

        if self.config.detach() {
            match sys::fork()? {
                ForkOutcome::Parent(child) => {
                    // The child shares the lock's open file description, so
                    // closing our descriptor here does not release it.
                    drop(lock);
                    return Ok(Launch::Parent { child });
                }
                ForkOutcome::Child => {}
            }

            sys::new_session()?;
            sys::ignore_sighup();

            // Second fork: the final process is not a session leader and can
            // never reacquire a controlling terminal.
            if let ForkOutcome::Parent(_) = sys::fork()? {
                sys::exit_now(0);
            }
            debug!("detached into daemon mode");
        }

        let Daemon { config, cleanup } = self;

        // From here on, any failure tears down through the handle: cleanup
        // closure, lock release, PID file removal.
        let handle = DaemonHandle::new(
            lock,
            config.pid_file_path().map(Path::to_path_buf),
            cleanup,
        );

        let env_dir = config
            .env_dir_path()
            .ok_or(DaemonError::MissingField("env_dir"))?;
        std::env::set_current_dir(env_dir).map_err(|source| DaemonError::Filesystem {
            action: "chdir to env dir",
            path: env_dir.to_path_buf(),
            source,
        })?;

        let log_dir = config.resolved_log_dir();
        if !log_dir.exists() {
            fs::create_dir(&log_dir).map_err(|source| DaemonError::Filesystem {
                action: "create log dir",
                path: log_dir.clone(),
                source,
            })?;
        }

        let streams = config.active_streams();
        redirect_stream(&streams.stdin, STDIN_SLOT, &log_dir)?;
        redirect_stream(&streams.stdout, STDOUT_SLOT, &log_dir)?;
        redirect_stream(&streams.stderr, STDERR_SLOT, &log_dir)?;

        sys::unlimit_core()?;

        if let Some(path) = config.pid_file_path() {
            pidfile::write(path)?;
        }

        #[cfg(target_os = "linux")]
        {
            if !config.detach() {
                // Foreground under systemd: report readiness. No-op otherwise.
                let _ = sd_notify::notify(true, &[NotifyState::Ready]);
            }
        }

        debug!("daemon setup complete, pid {}", std::process::id());
        Ok(Launch::Daemon(handle))
    }
}

fn redirect_stream(target: &Stdio, slot: StreamSlot, log_dir: &Path) -> DaemonResult<()> {
    let Some(path) = target.resolve(log_dir) else {
        return Ok(());
    };

    sys::rebind(slot, &path)?;

    if slot.writable && target.is_real_file() {
        // umask may have masked the create mode; external log readers rely
        // on 0644.
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).map_err(|source| {
            DaemonError::Filesystem {
                action: "chmod log file",
                path,
                source,
            }
        })?;
    }
    Ok(())
}
