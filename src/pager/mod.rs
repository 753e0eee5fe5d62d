//! # Pager
//!
//! Everything between a shell command and the screen.
//!
//! ```text
//! ┌────────────┐  bytes  ┌────────┐  lines/annotations  ┌───────┐  frame  ┌────────────┐
//! │ process    │────────▶│ buffer │────────────────────▶│ Pager │────────▶│ controller │
//! │ (ShellCmd) │         │        │◀── annotators       │       │◀─ keys ─│            │
//! └────────────┘         └────────┘                     └───────┘         └────────────┘
//!                                                          ▲
//!                                  modes ── listeners ─────┘
//! ```

pub mod buffer;
pub mod cmd_pager;
pub mod context;
pub mod controller;
pub mod events;
pub mod geometry;
pub mod io;
pub mod listeners;
pub mod modes;
pub mod process;
pub mod viewport;
pub mod views;

pub use buffer::{Annotation, Annotator, Buffer, RegexAnnotator};
pub use cmd_pager::Pager;
pub use context::Context;
pub use controller::AppController;
pub use events::{KeyEvent, KeyParseError, PagerAction};
pub use geometry::{PagerLayout, Rect};
pub use listeners::Listeners;
pub use modes::{ConfigError, IniMode, Mode, ModeRegistry};
pub use process::{OutputStream, ProcessError, ProcessState, ShellCommand};
pub use viewport::Viewport;
