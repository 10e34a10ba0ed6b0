use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::{DaemonError, DaemonResult};
use crate::stdio::StreamSlot;

/// Tagged outcome of one fork, so the detachment sequence reads as a state
/// transition instead of raw pid comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForkOutcome {
    /// Still the original process; carries the child's pid.
    Parent(libc::pid_t),
    /// The forked child continues daemon setup.
    Child,
}

pub(crate) fn fork() -> DaemonResult<ForkOutcome> {
    match unsafe { libc::fork() } {
        pid if pid < 0 => Err(syscall_error("fork")),
        0 => Ok(ForkOutcome::Child),
        pid => Ok(ForkOutcome::Parent(pid)),
    }
}

/// Becomes a new session and process-group leader, detaching from the
/// controlling terminal.
pub(crate) fn new_session() -> DaemonResult<()> {
    if unsafe { libc::setsid() } < 0 {
        return Err(syscall_error("setsid"));
    }
    Ok(())
}

/// Losing the session-leader role later must not terminate the daemon.
pub(crate) fn ignore_sighup() {
    unsafe {
        libc::signal(libc::SIGHUP, libc::SIG_IGN);
    }
}

/// Terminates immediately; no atexit handlers or destructors beyond what the
/// OS performs.
pub(crate) fn exit_now(status: i32) -> ! {
    unsafe { libc::_exit(status) }
}

/// Lifts the core dump size limit so daemon crashes stay diagnosable.
pub(crate) fn unlimit_core() -> DaemonResult<()> {
    let limits = libc::rlimit {
        rlim_cur: libc::RLIM_INFINITY,
        rlim_max: libc::RLIM_INFINITY,
    };
    if unsafe { libc::setrlimit(libc::RLIMIT_CORE, &limits) } < 0 {
        return Err(syscall_error("setrlimit"));
    }
    Ok(())
}

/// Rebinds one standard stream to `target`.
///
/// Closing the slot frees exactly that descriptor number, and no other
/// descriptor is opened in between, so the following `open` is guaranteed to
/// land on it. That coincidence is load-bearing; landing anywhere else is a
/// named error, not a silent misbind.
pub(crate) fn rebind(slot: StreamSlot, target: &Path) -> DaemonResult<()> {
    let c_path =
        CString::new(target.as_os_str().as_bytes()).map_err(|_| DaemonError::Redirect {
            stream: slot.name,
            target: target.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"),
        })?;

    let flags = if slot.writable {
        libc::O_CREAT | libc::O_WRONLY | libc::O_TRUNC
    } else {
        libc::O_RDONLY
    };

    unsafe { libc::close(slot.fd) };

    let fd = unsafe { libc::open(c_path.as_ptr(), flags, 0o644 as libc::c_uint) };
    if fd < 0 {
        return Err(DaemonError::Redirect {
            stream: slot.name,
            target: target.to_path_buf(),
            source: io::Error::last_os_error(),
        });
    }
    if fd != slot.fd {
        unsafe { libc::close(fd) };
        return Err(DaemonError::DescriptorMisplaced {
            stream: slot.name,
            fd,
        });
    }
    Ok(())
}

fn syscall_error(call: &'static str) -> DaemonError {
    DaemonError::Syscall {
        call,
        errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
    }
}
