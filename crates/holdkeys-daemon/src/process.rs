//! Child process supervision
//!
//! Hotkey commands run detached through `/bin/sh -c`. The daemon never waits
//! on a child synchronously: it sends SIGTERM when a chord breaks and collects
//! exit statuses later with non-blocking `waitpid`.

use std::io;
use std::process::Command;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

/// A running child started by a [`Launcher`].
///
/// Not `Clone`: exactly one owner refers to a given child at a time.
#[derive(Debug, PartialEq, Eq)]
pub struct ProcessHandle {
    pid: Pid,
}

impl ProcessHandle {
    pub(crate) fn from_pid(pid: Pid) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }
}

/// A child whose termination has been collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitedChild {
    pub pid: Pid,
    pub status: WaitStatus,
}

/// Process execution primitive used by the engine.
pub trait Launcher {
    /// Start `command` through the shell without waiting for it.
    fn spawn(&mut self, command: &str) -> io::Result<ProcessHandle>;

    /// Ask a child to stop. Does not wait for it.
    fn terminate(&mut self, child: &ProcessHandle) -> nix::Result<()>;

    /// Collect every child that has exited since the last call.
    ///
    /// Never blocks; returns an empty list when nothing has exited.
    fn try_reap(&mut self) -> Vec<ExitedChild>;
}

/// [`Launcher`] backed by `/bin/sh -c` and real signals.
///
/// Keeps track of every pid it started, including children whose handle has
/// since been replaced, so that all of them are eventually reaped.
#[derive(Debug, Default)]
pub struct ShellLauncher {
    outstanding: Vec<Pid>,
}

impl ShellLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of started children not yet reaped.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }
}

impl Launcher for ShellLauncher {
    fn spawn(&mut self, command: &str) -> io::Result<ProcessHandle> {
        // Dropping the std handle neither kills nor waits for the child
        let child = Command::new("/bin/sh").arg("-c").arg(command).spawn()?;
        let pid = Pid::from_raw(child.id() as i32);
        self.outstanding.push(pid);
        Ok(ProcessHandle::from_pid(pid))
    }

    fn terminate(&mut self, child: &ProcessHandle) -> nix::Result<()> {
        kill(child.pid, Signal::SIGTERM)
    }

    fn try_reap(&mut self) -> Vec<ExitedChild> {
        let mut exited = Vec::new();

        self.outstanding
            .retain(|&pid| match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(status @ (WaitStatus::Exited(..) | WaitStatus::Signaled(..))) => {
                    exited.push(ExitedChild { pid, status });
                    false
                }
                Ok(_) => true,
                Err(Errno::ECHILD) => {
                    tracing::debug!("Process {} was already reaped", pid);
                    false
                }
                Err(e) => {
                    tracing::warn!("waitpid({}) failed: {}", pid, e);
                    true
                }
            });

        exited
    }
}


#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    /// Poll until `pid` has been reaped, or give up after a few seconds.
    fn reap_within(launcher: &mut ShellLauncher, pid: Pid) -> Option<ExitedChild> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(child) = launcher.try_reap().into_iter().find(|c| c.pid == pid) {
                return Some(child);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        None
    }

    #[test]
    fn test_reap_with_nothing_started() {
        let mut launcher = ShellLauncher::new();
        assert!(launcher.try_reap().is_empty());
        assert!(launcher.try_reap().is_empty());
    }

    #[test]
    fn test_spawn_then_exit_is_reaped() {
        let mut launcher = ShellLauncher::new();
        let handle = launcher.spawn("exit 3").unwrap();

        let exited = reap_within(&mut launcher, handle.pid()).expect("child was never reaped");
        assert_eq!(exited.status, WaitStatus::Exited(handle.pid(), 3));
        assert_eq!(launcher.outstanding(), 0);
    }

    #[test]
    fn test_terminate_stops_long_running_child() {
        let mut launcher = ShellLauncher::new();
        let handle = launcher.spawn("sleep 30").unwrap();

        // Still running: reaping must not block or report it
        assert!(launcher.try_reap().is_empty());
        assert_eq!(launcher.outstanding(), 1);

        launcher.terminate(&handle).unwrap();

        let exited = reap_within(&mut launcher, handle.pid()).expect("child was never reaped");
        assert_eq!(
            exited.status,
            WaitStatus::Signaled(handle.pid(), Signal::SIGTERM, false)
        );
    }
}
