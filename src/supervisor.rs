//! Child-process lifecycle.
//!
//! [`Supervisor::spawn`] launches each command through `/bin/sh -c` with the
//! container's window id exported in the environment, so the child can
//! embed itself.  Every child gets a [`ChildWatcher`] thread that waits for
//! it and forwards a [`Notification::ChildExited`]; the bookkeeping that
//! follows (slot removal, deciding whether to exit) happens on the main
//! loop through [`ProcessTable`].

use crate::command::{Notification, Pid, SurfaceId};
use crate::traits::NotificationSource;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus};
use std::sync::mpsc;

/// Shell used to run every command line.
pub const SHELL: &str = "/bin/sh";

/// Prefix of the environment variables exported to children.
///
/// Override at build time with `GRIDDED_ENV_PREFIX=...`.
pub const ENV_PREFIX: &str = match option_env!("GRIDDED_ENV_PREFIX") {
    Some(prefix) => prefix,
    None => "GRIDDED_",
};

/// Name of the variable carrying the container window id.
pub fn parent_window_var() -> String {
    format!("{}PARENT_WIN", ENV_PREFIX)
}

/// Failure to start a child.
#[derive(Debug, thiserror::Error)]
#[error("failed to spawn {command:?}: {source}")]
pub struct SpawnError {
    pub command: String,
    #[source]
    pub source: std::io::Error,
}

/// Map a wait status to a process exit code: the child's own code, or
/// `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => 127,
    }
}

/// Launches commands on behalf of the embedder.
pub struct Supervisor {
    container: SurfaceId,
    sink: mpsc::Sender<Notification>,
}

impl Supervisor {
    /// `sink` receives one [`Notification::ChildExited`] per spawned child.
    pub fn new(container: SurfaceId, sink: mpsc::Sender<Notification>) -> Self {
        Self { container, sink }
    }

    /// Start `command` and a watcher thread for it.
    pub fn spawn(&self, command: &str) -> Result<Pid, SpawnError> {
        let child = Command::new(SHELL)
            .arg("-c")
            .arg(command)
            .env(parent_window_var(), self.container.to_string())
            .spawn()
            .map_err(|source| SpawnError {
                command: command.to_string(),
                source,
            })?;
        let pid = child.id();
        info!("spawned {:?} as pid {}", command, pid);

        let sink = self.sink.clone();
        std::thread::spawn(move || {
            let mut watcher = ChildWatcher::new(child);
            if let Err(e) = watcher.run(sink) {
                error!("child watcher for pid {} failed: {}", pid, e);
            }
        });
        Ok(pid)
    }
}

/// A [`NotificationSource`] that emits a single
/// [`Notification::ChildExited`] when its child terminates.
pub struct ChildWatcher {
    child: Child,
}

impl ChildWatcher {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl NotificationSource for ChildWatcher {
    type Error = std::io::Error;

    fn run(&mut self, sink: mpsc::Sender<Notification>) -> Result<(), Self::Error> {
        let status = self.child.wait()?;
        let pid = self.child.id();
        debug!("pid {} exited with {}", pid, status);
        let _ = sink.send(Notification::ChildExited {
            pid,
            code: exit_code(status),
        });
        Ok(())
    }
}

/// What to do when the last tracked child has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Exit with the last child's exit code.
    #[default]
    WithLastChild,
    /// Keep running until the window-system connection closes.
    OnDisconnect,
}

/// Live children as seen by the main loop.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    live: HashSet<Pid>,
    policy: ExitPolicy,
}

impl ProcessTable {
    pub fn new(policy: ExitPolicy) -> Self {
        Self {
            live: HashSet::new(),
            policy,
        }
    }

    pub fn track(&mut self, pid: Pid) {
        self.live.insert(pid);
    }

    /// Record that `pid` exited with `code`.
    ///
    /// Returns the code the whole program should exit with, if any.
    pub fn reap(&mut self, pid: Pid, code: i32) -> Option<i32> {
        if !self.live.remove(&pid) {
            debug!("exit of untracked pid {}", pid);
            return None;
        }
        if self.live.is_empty() && self.policy == ExitPolicy::WithLastChild {
            info!("last child (pid {}) exited with {}", pid, code);
            Some(code)
        } else {
            None
        }
    }

    pub fn live(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn expect_exit(rx: &mpsc::Receiver<Notification>) -> (Pid, i32) {
        match rx.recv_timeout(Duration::from_secs(10)) {
            Ok(Notification::ChildExited { pid, code }) => (pid, code),
            other => panic!("expected ChildExited, got {:?}", other),
        }
    }

    #[test]
    fn env_var_uses_prefix() {
        assert!(parent_window_var().ends_with("PARENT_WIN"));
        assert!(parent_window_var().starts_with(ENV_PREFIX));
    }

    #[test]
    fn exit_code_from_normal_exit() {
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
    }

    #[test]
    fn exit_code_from_signal() {
        // Raw wait status of a process killed by SIGKILL.
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 128 + 9);
    }

    #[test]
    fn spawned_child_reports_its_exit_code() {
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::new(0x1234, tx);
        let pid = sup.spawn("exit 7").unwrap();
        assert_eq!(expect_exit(&rx), (pid, 7));
    }

    #[test]
    fn child_sees_container_id() {
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::new(4242, tx);
        let script = format!("test \"${}\" = 4242", parent_window_var());
        sup.spawn(&script).unwrap();
        assert_eq!(expect_exit(&rx).1, 0);
    }

    #[test]
    fn killed_child_maps_to_signal_code() {
        let (tx, rx) = mpsc::channel();
        let sup = Supervisor::new(1, tx);
        sup.spawn("kill -9 $$").unwrap();
        assert_eq!(expect_exit(&rx).1, 137);
    }

    #[test]
    fn table_exits_with_last_child() {
        let mut t = ProcessTable::new(ExitPolicy::WithLastChild);
        t.track(10);
        t.track(11);
        assert_eq!(t.reap(10, 4), None);
        assert_eq!(t.live(), 1);
        assert_eq!(t.reap(11, 2), Some(2));
    }

    #[test]
    fn table_ignores_untracked_pids() {
        let mut t = ProcessTable::new(ExitPolicy::WithLastChild);
        t.track(10);
        assert_eq!(t.reap(99, 1), None);
        assert_eq!(t.live(), 1);
    }

    #[test]
    fn table_keeps_running_on_disconnect_policy() {
        let mut t = ProcessTable::new(ExitPolicy::OnDisconnect);
        t.track(10);
        assert_eq!(t.reap(10, 0), None);
        assert_eq!(t.live(), 0);
    }
}
