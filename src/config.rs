use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DaemonError, DaemonResult};
use crate::stdio::Stdio;

/// Selects which of the two stream-target sets is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoMode {
    /// Production mode; targets come from `io_daemon`.
    Daemon,
    /// Interactive debugging; targets come from `io_debug`.
    #[default]
    Debug,
}

/// Per-mode targets for the three standard streams.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSet {
    pub stdin: Stdio,
    pub stdout: Stdio,
    pub stderr: Stdio,
}

impl Default for StreamSet {
    fn default() -> Self {
        StreamSet {
            stdin: Stdio::Keep,
            stdout: Stdio::Keep,
            stderr: Stdio::Keep,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct LogSection {
    dir: PathBuf,
}

impl Default for LogSection {
    fn default() -> Self {
        LogSection {
            dir: PathBuf::from("log"),
        }
    }
}

/// Daemon configuration record.
///
/// Deserializable from the caller's config format (JSON, TOML) or assembled
/// through the builder methods. The two required fields, [`env_dir`] and
/// [`as_daemon`], stay `Option` so that [`validate`] can report absence as a
/// configuration error before any OS resource is touched.
///
/// [`env_dir`]: DaemonConfig::env_dir
/// [`as_daemon`]: DaemonConfig::as_daemon
/// [`validate`]: DaemonConfig::validate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    env_dir: Option<PathBuf>,
    as_daemon: Option<bool>,
    lock_file: Option<PathBuf>,
    pid_file: Option<PathBuf>,
    io_mode: IoMode,
    io_daemon: StreamSet,
    io_debug: StreamSet,
    log: LogSection,
}

impl DaemonConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Builder methods ---

    /// Sets the working directory for the daemon. Required.
    pub fn env_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.env_dir = Some(path.into());
        self
    }

    /// Whether to detach into the background. Required.
    ///
    /// When `false`, forking is skipped entirely but locking, stream
    /// redirection, and PID persistence still run.
    pub fn as_daemon(mut self, daemonize: bool) -> Self {
        self.as_daemon = Some(daemonize);
        self
    }

    /// Path to an existing file used purely as a singleton lock target.
    pub fn lock_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.lock_file = Some(path.into());
        self
    }

    /// Path to write the decimal process id of the final daemon.
    pub fn pid_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.pid_file = Some(path.into());
        self
    }

    /// Selects the active stream-target set.
    pub fn io_mode(mut self, mode: IoMode) -> Self {
        self.io_mode = mode;
        self
    }

    /// Stream targets used in [`IoMode::Daemon`].
    pub fn daemon_streams(mut self, streams: StreamSet) -> Self {
        self.io_daemon = streams;
        self
    }

    /// Stream targets used in [`IoMode::Debug`].
    pub fn debug_streams(mut self, streams: StreamSet) -> Self {
        self.io_debug = streams;
        self
    }

    /// Log directory, resolved under the environment root unless absolute.
    pub fn log_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log.dir = path.into();
        self
    }

    // --- Accessors ---

    pub fn env_dir_path(&self) -> Option<&Path> {
        self.env_dir.as_deref()
    }

    pub fn lock_file_path(&self) -> Option<&Path> {
        self.lock_file.as_deref()
    }

    pub fn pid_file_path(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    pub fn mode(&self) -> IoMode {
        self.io_mode
    }

    pub(crate) fn detach(&self) -> bool {
        self.as_daemon.unwrap_or(false)
    }

    pub(crate) fn active_streams(&self) -> &StreamSet {
        match self.io_mode {
            IoMode::Daemon => &self.io_daemon,
            IoMode::Debug => &self.io_debug,
        }
    }

    /// Resolves the log directory: absolute passes through, relative lands
    /// under the environment root.
    pub(crate) fn resolved_log_dir(&self) -> PathBuf {
        let root = self.env_dir.as_deref().unwrap_or(Path::new("."));
        if self.log.dir.is_absolute() {
            self.log.dir.clone()
        } else {
            root.join(&self.log.dir)
        }
    }

    /// Presence check for the required fields. Runs strictly before any
    /// OS-level action.
    pub fn validate(&self) -> DaemonResult<()> {
        if self.env_dir.is_none() {
            return Err(DaemonError::MissingField("env_dir"));
        }
        if self.as_daemon.is_none() {
            return Err(DaemonError::MissingField("as_daemon"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_missing_env_dir() {
        let config = DaemonConfig::new().as_daemon(true);
        match config.validate() {
            Err(DaemonError::MissingField(field)) => assert_eq!(field, "env_dir"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_missing_as_daemon() {
        let config = DaemonConfig::new().env_dir("/tmp/d");
        match config.validate() {
            Err(DaemonError::MissingField(field)) => assert_eq!(field, "as_daemon"),
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn deserializes_full_record() {
        let config: DaemonConfig = serde_json::from_str(
            r#"{
                "env_dir": "/tmp/d",
                "as_daemon": true,
                "lock_file": "/tmp/d/app.lock",
                "pid_file": "/tmp/d/app.pid",
                "io_mode": "daemon",
                "io_daemon": {"stdin": "/dev/null", "stdout": "out.log", "stderr": "err.log"},
                "log": {"dir": "log"}
            }"#,
        )
        .unwrap();

        config.validate().unwrap();
        assert!(config.detach());
        assert_eq!(config.mode(), IoMode::Daemon);
        assert_eq!(config.lock_file_path(), Some(Path::new("/tmp/d/app.lock")));
        assert_eq!(config.pid_file_path(), Some(Path::new("/tmp/d/app.pid")));

        let streams = config.active_streams();
        assert_eq!(streams.stdin, Stdio::Devnull);
        assert_eq!(streams.stdout, Stdio::File(PathBuf::from("out.log")));
        assert_eq!(streams.stderr, Stdio::File(PathBuf::from("err.log")));
    }

    #[test]
    fn mode_defaults_to_debug_with_untouched_streams() {
        let config: DaemonConfig =
            serde_json::from_str(r#"{"env_dir": "/tmp/d", "as_daemon": false}"#).unwrap();
        assert_eq!(config.mode(), IoMode::Debug);
        assert_eq!(config.active_streams().stdout, Stdio::Keep);
    }

    #[test]
    fn log_dir_resolves_under_env_root() {
        let config = DaemonConfig::new().env_dir("/tmp/d").log_dir("log");
        assert_eq!(config.resolved_log_dir(), PathBuf::from("/tmp/d/log"));

        let absolute = DaemonConfig::new().env_dir("/tmp/d").log_dir("/var/log/app");
        assert_eq!(absolute.resolved_log_dir(), PathBuf::from("/var/log/app"));
    }
}
