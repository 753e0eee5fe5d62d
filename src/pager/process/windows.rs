//! Windows process trees: `taskkill /T /F` walks and kills the descendants.

use super::OwnedProcess;
use std::process::Stdio;
use tokio::process::Child;

const COMSPEC_ENV_VAR: &str = "COMSPEC";
const FALLBACK_SHELL: &str = "cmd.exe";

pub(super) fn shell_invocation() -> (String, &'static str) {
    let shell = std::env::var(COMSPEC_ENV_VAR)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SHELL.to_string());
    (shell, "/C")
}

pub(super) fn configure(_command: &mut std::process::Command) {}

pub(super) fn own(child: Child) -> Box<dyn OwnedProcess> {
    Box::new(ProcessTree::new(child))
}

/// A child process and whatever it spawned
#[derive(Debug)]
pub struct ProcessTree {
    child: Child,
}

impl ProcessTree {
    pub fn new(child: Child) -> Self {
        Self { child }
    }
}

impl OwnedProcess for ProcessTree {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn terminate_tree(&mut self) {
        let Some(pid) = self.child.id() else {
            return;
        };
        let spawned = std::process::Command::new("taskkill")
            .args(["/T", "/F", "/PID", &pid.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(err) = spawned {
            tracing::debug!("taskkill for {} failed to start: {}", pid, err);
            if let Err(err) = self.child.start_kill() {
                tracing::debug!("failed to kill {}: {}", pid, err);
            }
        }
    }
}
