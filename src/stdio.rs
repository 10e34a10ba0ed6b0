use std::path::{Path, PathBuf};

use serde::Deserialize;

pub(crate) const DEV_NULL: &str = "/dev/null";

/// Defines the behavior of a standard stream (stdin, stdout, stderr) after
/// daemonization.
///
/// In configuration files a target is a plain string: the stream's own name
/// (or an empty string) keeps the stream untouched, `/dev/null` discards it,
/// and anything else names a log file resolved under the log directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Stdio {
    /// Keeps the original stream (useful for debugging).
    Keep,
    /// Redirects the stream to `/dev/null`.
    Devnull,
    /// Redirects the stream to the named file, resolved under the log
    /// directory unless the path is absolute.
    File(PathBuf),
}

impl Stdio {
    /// Creates a configuration that discards the stream.
    pub fn devnull() -> Self {
        Stdio::Devnull
    }

    /// Resolves this target to a concrete filesystem path.
    ///
    /// Returns `None` for [`Stdio::Keep`]. Absolute file paths pass through
    /// unchanged; relative ones resolve under `log_dir`.
    pub(crate) fn resolve(&self, log_dir: &Path) -> Option<PathBuf> {
        match self {
            Stdio::Keep => None,
            Stdio::Devnull => Some(PathBuf::from(DEV_NULL)),
            Stdio::File(name) => {
                if name.is_absolute() {
                    Some(name.clone())
                } else {
                    Some(log_dir.join(name))
                }
            }
        }
    }

    /// True when the target is a real file whose permissions must be fixed
    /// up after redirection.
    pub(crate) fn is_real_file(&self) -> bool {
        matches!(self, Stdio::File(_))
    }
}

impl From<String> for Stdio {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" | "stdin" | "stdout" | "stderr" => Stdio::Keep,
            DEV_NULL => Stdio::Devnull,
            _ => Stdio::File(PathBuf::from(s)),
        }
    }
}

impl From<&str> for Stdio {
    fn from(s: &str) -> Self {
        Stdio::from(s.to_owned())
    }
}

/// One well-known stream slot. The descriptor number is load-bearing: after
/// closing it, the very next `open` must land exactly there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StreamSlot {
    pub name: &'static str,
    pub fd: i32,
    pub writable: bool,
}

pub(crate) const STDIN_SLOT: StreamSlot = StreamSlot {
    name: "stdin",
    fd: 0,
    writable: false,
};

pub(crate) const STDOUT_SLOT: StreamSlot = StreamSlot {
    name: "stdout",
    fd: 1,
    writable: true,
};

pub(crate) const STDERR_SLOT: StreamSlot = StreamSlot {
    name: "stderr",
    fd: 2,
    writable: true,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_name_means_keep() {
        assert_eq!(Stdio::from("stdin"), Stdio::Keep);
        assert_eq!(Stdio::from("stdout"), Stdio::Keep);
        assert_eq!(Stdio::from("stderr"), Stdio::Keep);
        assert_eq!(Stdio::from(""), Stdio::Keep);
    }

    #[test]
    fn devnull_and_files_parse() {
        assert_eq!(Stdio::from("/dev/null"), Stdio::Devnull);
        assert_eq!(Stdio::from("out.log"), Stdio::File(PathBuf::from("out.log")));
    }

    #[test]
    fn relative_file_resolves_under_log_dir() {
        let target = Stdio::from("out.log");
        assert_eq!(
            target.resolve(Path::new("/tmp/d/log")),
            Some(PathBuf::from("/tmp/d/log/out.log"))
        );
    }

    #[test]
    fn absolute_file_passes_through() {
        let target = Stdio::from("/var/log/app.log");
        assert_eq!(
            target.resolve(Path::new("/tmp/d/log")),
            Some(PathBuf::from("/var/log/app.log"))
        );
    }

    #[test]
    fn keep_resolves_to_nothing() {
        assert_eq!(Stdio::Keep.resolve(Path::new("/tmp")), None);
    }
}
