//! # Process Wrapper
//!
//! Runs a command line through the user's shell, exposes stdout and stderr as
//! one stream of byte chunks, and kills the whole process tree on close.
//!
//! ```text
//!  $SHELL -c "<command>"
//!        │ stdout ──▶ forward task ──┐
//!        │ stderr ──▶ forward task ──┴──▶ OutputStream
//!        ▼
//!  OwnedProcess (process group / process tree)
//! ```
//!
//! Chunks from one pipe keep their order; how the two pipes interleave is
//! whatever the scheduler produces.
//!
//! Lifecycle is `Created → Running → Closed`. A closed command is never
//! restarted; reloading creates a new [`ShellCommand`].

use std::process::Stdio;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as platform;
#[cfg(unix)]
pub use unix::ProcessGroup;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as platform;
#[cfg(windows)]
pub use windows::ProcessTree;

/// Chunks buffered between the pipe readers and the consumer
const CHANNEL_CAPACITY: usize = 64;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Errors raised while starting a command
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}` with {shell}: {source}")]
    Spawn {
        shell: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} pipe of the child process is unavailable")]
    MissingPipe(&'static str),
    #[error("command was already started")]
    AlreadyStarted,
}

/// A spawned process whose whole tree can be terminated
///
/// Implementations are platform specific: Unix signals the process group the
/// child leads, Windows asks `taskkill` to walk the tree.
pub trait OwnedProcess: Send {
    /// OS process id, if the process has not been reaped
    fn id(&self) -> Option<u32>;

    /// Request termination of the process and all of its descendants.
    /// Never blocks on the exit and never reports failure.
    fn terminate_tree(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Created,
    Running,
    Closed,
}

/// Merged stdout/stderr of a command
#[derive(Debug)]
pub struct OutputStream {
    chunks: mpsc::Receiver<Vec<u8>>,
}

impl OutputStream {
    /// Stream fed by the returned sender; closes when every sender is dropped
    pub fn channel(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { chunks: rx })
    }

    /// Next chunk of output, `None` once both pipes are closed
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.chunks.recv().await
    }

    /// Collect everything until the stream ends
    pub async fn read_to_end(mut self) -> Vec<u8> {
        let mut output = Vec::new();
        while let Some(chunk) = self.recv().await {
            output.extend_from_slice(&chunk);
        }
        output
    }
}

/// A shell-invoked command
pub struct ShellCommand {
    command_line: String,
    shell: String,
    shell_flag: &'static str,
    state: ProcessState,
    process: Option<Box<dyn OwnedProcess>>,
}

impl ShellCommand {
    /// Command that will run through the user's shell
    pub fn new(command_line: impl Into<String>) -> Self {
        let (shell, shell_flag) = platform::shell_invocation();
        Self {
            command_line: command_line.into(),
            shell,
            shell_flag,
            state: ProcessState::Created,
            process: None,
        }
    }

    /// Command that will run through an explicit shell binary
    pub fn with_shell(command_line: impl Into<String>, shell: impl Into<String>) -> Self {
        let mut command = Self::new(command_line);
        command.shell = shell.into();
        command
    }

    /// Create and start in one step
    pub fn spawn(command_line: impl Into<String>) -> Result<(Self, OutputStream), ProcessError> {
        let mut command = Self::new(command_line);
        let stream = command.start()?;
        Ok((command, stream))
    }

    /// Start the process; must be called inside a tokio runtime
    pub fn start(&mut self) -> Result<OutputStream, ProcessError> {
        if self.state != ProcessState::Created {
            return Err(ProcessError::AlreadyStarted);
        }

        let mut std_command = std::process::Command::new(&self.shell);
        std_command
            .arg(self.shell_flag)
            .arg(&self.command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        platform::configure(&mut std_command);

        let mut child = tokio::process::Command::from(std_command)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                shell: self.shell.clone(),
                command: self.command_line.clone(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let mut process = platform::own(child);
        let (stdout, stderr) = match (stdout, stderr) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            (stdout, _) => {
                process.terminate_tree();
                self.state = ProcessState::Closed;
                let missing = if stdout.is_none() { "stdout" } else { "stderr" };
                return Err(ProcessError::MissingPipe(missing));
            }
        };

        let (tx, stream) = OutputStream::channel(CHANNEL_CAPACITY);
        tokio::spawn(forward(stdout, tx.clone()));
        tokio::spawn(forward(stderr, tx));

        tracing::debug!(
            "started `{}` via {} (pid {:?})",
            self.command_line,
            self.shell,
            process.id()
        );
        self.process = Some(process);
        self.state = ProcessState::Running;
        Ok(stream)
    }

    /// Kill the process tree. Idempotent; does not wait for exit.
    pub fn close(&mut self) {
        if self.state == ProcessState::Closed {
            return;
        }
        if let Some(mut process) = self.process.take() {
            process.terminate_tree();
        }
        self.state = ProcessState::Closed;
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.id())
    }
}

impl Drop for ShellCommand {
    fn drop(&mut self) {
        self.close();
    }
}

async fn forward<R: AsyncRead + Unpin>(mut pipe: R, chunks: mpsc::Sender<Vec<u8>>) {
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if chunks.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::debug!("pipe read failed: {}", err);
                break;
            }
        }
    }
}
