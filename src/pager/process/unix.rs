//! Unix process trees: the child leads a fresh process group and the whole
//! group receives SIGKILL on close.

use super::OwnedProcess;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use tokio::process::Child;

const SHELL_ENV_VAR: &str = "SHELL";
const FALLBACK_SHELL: &str = "/bin/sh";

/// Shell binary and the flag that makes it run a command string
pub(super) fn shell_invocation() -> (String, &'static str) {
    let shell = std::env::var(SHELL_ENV_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string());
    (shell, "-c")
}

/// Descendants inherit the group, so one killpg reaches all of them
pub(super) fn configure(command: &mut std::process::Command) {
    command.process_group(0);
}

pub(super) fn own(child: Child) -> Box<dyn OwnedProcess> {
    Box::new(ProcessGroup::new(child))
}

/// A child process leading its own process group
#[derive(Debug)]
pub struct ProcessGroup {
    child: Child,
}

impl ProcessGroup {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl OwnedProcess for ProcessGroup {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate_tree(&mut self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        let Ok(raw) = i32::try_from(pid) else {
            return;
        };
        match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => tracing::debug!("killed process group {}", pid),
            Err(err) => tracing::debug!("failed to kill process group {}: {}", pid, err),
        }
        // the group leader is reaped by tokio's orphan queue once it exits
        if let Err(err) = self.child.start_kill() {
            tracing::trace!("leader {} already gone: {}", pid, err);
        }
    }
}
