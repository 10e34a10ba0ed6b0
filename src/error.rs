use std::fmt;
use std::io;
use std::path::PathBuf;

/// Custom error type for unidaemon.
/// Every variant is a fatal startup precondition failure; there is no retry
/// policy anywhere in this crate.
#[derive(Debug)]
pub enum DaemonError {
    /// A required configuration field was absent.
    MissingField(&'static str),
    /// The lock file could not be opened (missing file, permission denied).
    LockUnavailable { path: PathBuf, source: io::Error },
    /// The lock file is already held exclusively by another process.
    LockHeld { path: PathBuf },
    /// A filesystem operation (chdir, mkdir, chmod, pid write) failed.
    Filesystem {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
    /// Opening a stream redirection target failed.
    Redirect {
        stream: &'static str,
        target: PathBuf,
        source: io::Error,
    },
    /// A redirected stream did not land on its well-known descriptor (0/1/2).
    DescriptorMisplaced { stream: &'static str, fd: i32 },
    /// A process-control syscall (fork, setsid, setrlimit) failed.
    Syscall { call: &'static str, errno: i32 },
    /// Uncategorized IO error.
    Io(io::Error),
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonError::MissingField(field) => {
                write!(f, "daemon config must provide \"{}\"", field)
            }
            DaemonError::LockUnavailable { path, source } => {
                write!(f, "can't open lock file \"{}\": {}", path.display(), source)
            }
            DaemonError::LockHeld { path } => write!(
                f,
                "can't lock the lock file \"{}\"; is another instance running?",
                path.display()
            ),
            DaemonError::Filesystem {
                action,
                path,
                source,
            } => {
                write!(f, "{} \"{}\" failed: {}", action, path.display(), source)
            }
            DaemonError::Redirect {
                stream,
                target,
                source,
            } => write!(
                f,
                "unable to redirect {} to \"{}\": {}",
                stream,
                target.display(),
                source
            ),
            DaemonError::DescriptorMisplaced { stream, fd } => write!(
                f,
                "{} redirection landed on descriptor {} instead of its own slot",
                stream, fd
            ),
            DaemonError::Syscall { call, errno } => {
                write!(f, "syscall '{}' failed with errno {}", call, errno)
            }
            DaemonError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DaemonError::LockUnavailable { source, .. }
            | DaemonError::Filesystem { source, .. }
            | DaemonError::Redirect { source, .. } => Some(source),
            DaemonError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DaemonError {
    fn from(err: io::Error) -> Self {
        DaemonError::Io(err)
    }
}

/// A specialized Result type for unidaemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
