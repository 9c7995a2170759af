//! Pid-file liveness probing and confirmed termination.
//!
//! A missing pid file is an expected absence, reported as `(false, 0)` in the
//! companion daemons' convention, never as an error. ESRCH from the kernel
//! means the same thing. Any other probe errno (EPERM in practice) signals an
//! environment fault and propagates as fatal.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::core::errors::{Result, WrError};

/// Read a pid from `path`. Missing file is `Ok(None)`; unparseable content is
/// a [`WrError::PidParse`].
pub fn read_pid(path: &Path) -> Result<Option<i32>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(WrError::io(path, e)),
    };
    raw.trim()
        .parse::<i32>()
        .map(Some)
        .map_err(|e| WrError::PidParse {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
}

/// Whether the process recorded in `path` is alive.
///
/// Returns `(true, pid)` or `(false, 0)`, mirroring the record the pid file
/// owner maintains. The probe is the zero-effect `kill(pid, 0)`.
pub fn pid_running(path: &Path) -> Result<(bool, i32)> {
    let Some(pid) = read_pid(path)? else {
        return Ok((false, 0));
    };
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => Ok((true, pid)),
        Err(Errno::ESRCH) => Ok((false, 0)),
        Err(errno) => Err(WrError::Probe {
            pid,
            details: errno.to_string(),
        }),
    }
}

/// Terminate the process recorded in `path`, waiting for confirmed exit.
///
/// SIGTERM is re-sent at `poll` intervals until the kernel reports ESRCH.
/// Missing pid file returns `(false, 0)` immediately. Exceeding `max_wait`
/// is a [`WrError::TerminateTimeout`], which shutdown paths log and tolerate.
pub fn kill_pid_if_exists(
    path: &Path,
    max_wait: Duration,
    poll: Duration,
) -> Result<(bool, i32)> {
    let Some(pid) = read_pid(path)? else {
        return Ok((false, 0));
    };
    tracing::debug!(pid, path = %path.display(), "terminating recorded process");
    let deadline = Instant::now() + max_wait;
    loop {
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => {}
            Err(Errno::ESRCH) => {
                tracing::debug!(pid, "process exited");
                return Ok((true, pid));
            }
            Err(errno) => {
                return Err(WrError::Probe {
                    pid,
                    details: errno.to_string(),
                });
            }
        }
        if Instant::now() >= deadline {
            return Err(WrError::TerminateTimeout {
                pid,
                waited: max_wait,
            });
        }
        thread::sleep(poll);
    }
}

#[cfg(test)]
mod tests {
    use super::{kill_pid_if_exists, pid_running, read_pid};
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn pidfile(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = tmp.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_pidfile_reports_not_running() {
        let tmp = TempDir::new().unwrap();
        let (running, pid) = pid_running(&tmp.path().join("absent.pid")).unwrap();
        assert!(!running);
        assert_eq!(pid, 0);
    }

    #[test]
    fn own_pid_reports_running() {
        let tmp = TempDir::new().unwrap();
        let own = i32::try_from(std::process::id()).unwrap();
        let path = pidfile(&tmp, "self.pid", &format!("{own}\n"));
        let (running, pid) = pid_running(&path).unwrap();
        assert!(running);
        assert_eq!(pid, own);
    }

    #[test]
    fn stale_pid_reports_not_running() {
        // PID well above default /proc/sys/kernel/pid_max.
        let tmp = TempDir::new().unwrap();
        let path = pidfile(&tmp, "stale.pid", "999999999");
        let (running, pid) = pid_running(&path).unwrap();
        assert!(!running);
        assert_eq!(pid, 0);
    }

    #[test]
    fn malformed_pidfile_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = pidfile(&tmp, "junk.pid", "not-a-pid");
        let err = pid_running(&path).unwrap_err();
        assert_eq!(err.code(), "WR-2001");
    }

    #[test]
    fn empty_pidfile_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = pidfile(&tmp, "empty.pid", "");
        assert_eq!(read_pid(&path).unwrap_err().code(), "WR-2001");
    }

    #[test]
    fn terminate_missing_pidfile_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let (was_running, pid) = kill_pid_if_exists(
            &tmp.path().join("absent.pid"),
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .unwrap();
        assert!(!was_running);
        assert_eq!(pid, 0);
    }

    #[test]
    fn terminate_waits_for_confirmed_exit() {
        let tmp = TempDir::new().unwrap();
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let child_pid = i32::try_from(child.id()).unwrap();
        let path = pidfile(&tmp, "child.pid", &child_pid.to_string());

        // Reap in the background so the pid leaves the process table and the
        // ESRCH confirmation can be observed.
        let reaper = std::thread::spawn(move || {
            let _ = child.wait();
        });

        let (was_running, pid) =
            kill_pid_if_exists(&path, Duration::from_secs(10), Duration::from_millis(20)).unwrap();
        assert!(was_running);
        assert_eq!(pid, child_pid);
        reaper.join().unwrap();
    }

    #[test]
    fn terminate_times_out_on_unkillable_process() {
        // A SIGTERM-ignoring child never reaches ESRCH within the bound.
        let tmp = TempDir::new().unwrap();
        let mut child = std::process::Command::new("/bin/sh")
            .args(["-c", "trap '' TERM; sleep 30"])
            .spawn()
            .unwrap();
        let path = pidfile(&tmp, "stubborn.pid", &child.id().to_string());

        let err = kill_pid_if_exists(
            &path,
            Duration::from_millis(200),
            Duration::from_millis(50),
        )
        .unwrap_err();
        assert_eq!(err.code(), "WR-2003");
        assert!(!err.is_fatal());

        let _ = child.kill();
        let _ = child.wait();
    }
}
