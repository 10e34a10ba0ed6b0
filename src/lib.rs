//! # unidaemon
//!
//! Turns a foreground process into a detached, single-instance background
//! daemon: double-fork detachment, an exclusive advisory lock so only one
//! instance runs, a PID file for external tooling, and redirection of the
//! three standard streams to log files or `/dev/null`.
//!
//! The whole sequence funnels through one teardown guard, so whichever step
//! fails, the cleanup closure runs and previously acquired resources are
//! released before the process disappears.
//!
//! ```no_run
//! use unidaemon::{Daemon, DaemonConfig, IoMode, Launch};
//!
//! fn main() -> unidaemon::DaemonResult<()> {
//!     let config = DaemonConfig::new()
//!         .env_dir("/var/lib/myapp")
//!         .as_daemon(true)
//!         .lock_file("/var/lib/myapp/app.lock")
//!         .pid_file("/var/lib/myapp/app.pid")
//!         .io_mode(IoMode::Daemon);
//!
//!     match Daemon::new(config).launch()? {
//!         Launch::Parent { .. } => Ok(()), // detached child carries on
//!         Launch::Daemon(handle) => {
//!             // ... the daemon's actual work ...
//!             handle.exit(0)
//!         }
//!     }
//! }
//! ```

#[cfg(not(unix))]
compile_error!("unidaemon only supports Unix platforms");

mod config;
mod daemon;
mod error;
mod guard;
mod lock;
mod pidfile;
mod stdio;
mod sys;

// Re-export public types to keep the API flat
pub use config::{DaemonConfig, IoMode, StreamSet};
pub use daemon::{Daemon, Launch};
pub use error::{DaemonError, DaemonResult};
pub use guard::DaemonHandle;
pub use lock::LockFile;
pub use stdio::Stdio;
