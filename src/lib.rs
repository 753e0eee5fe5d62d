//! # rat - Streaming Command Pager
//!
//! Runs a shell command and pages its output while it is still being
//! produced. Background annotators classify output lines (a commit id, a
//! file path, ...) and key bindings act on whatever sits under the cursor,
//! typically by opening another pager on a derived command.
//!
//! ```text
//!   rat -m git-log git log
//!        │
//!        ▼
//!   AppController ── Pager stack ── top Pager ── ShellCommand + Buffer
//!                                          │
//!                          enter on "sha" ─┴─▶ Pager("git show ${sha}")
//! ```

pub mod cmd_args;
pub mod config;
pub mod pager;

pub use pager::*;
