//! # I/O Abstraction Layer
//!
//! Input events and terminal output sit behind two traits so the controller
//! can run against a real terminal or against scripted mocks.
//!
//! ```text
//! Production:  AppController ──▶ TerminalEventStream  ──▶ crossterm::event::poll()/read()
//!                            ──▶ TerminalRenderStream ──▶ stdout
//!
//! Testing:     AppController ──▶ MockEventStream      ──▶ VecDeque<Event>
//!                            ──▶ MockRenderStream     ──▶ Vec<RenderCommand>
//! ```
//!
//! Pagers draw by queueing crossterm commands into the render stream's
//! `Write` half; the trait methods cover terminal state that is not plain
//! output.

use anyhow::Result;
use crossterm::event::Event;
use std::io::Write;
use std::time::Duration;

pub mod mock;
pub mod terminal;

pub use mock::{MockEventStream, MockRenderStream, RenderCommand};
pub use terminal::{TerminalEventStream, TerminalRenderStream};

/// Terminal size as (width, height)
pub type TerminalSize = (u16, u16);

/// Source of input events
pub trait EventStream: Send {
    /// Whether an event is ready within `timeout`
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Next event; only called after `poll` returned true
    fn read(&mut self) -> Result<Event>;
}

/// Terminal output plus the terminal modes a full-screen pager needs
pub trait RenderStream: Write + Send {
    fn clear_screen(&mut self) -> Result<()>;

    fn hide_cursor(&mut self) -> Result<()>;

    fn show_cursor(&mut self) -> Result<()>;

    /// Terminal size as (width, height)
    fn get_size(&self) -> Result<TerminalSize>;

    fn enter_alternate_screen(&mut self) -> Result<()>;

    fn leave_alternate_screen(&mut self) -> Result<()>;

    fn enable_raw_mode(&mut self) -> Result<()>;

    fn disable_raw_mode(&mut self) -> Result<()>;
}
