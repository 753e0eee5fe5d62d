//! # Mock I/O
//!
//! Scripted events and recorded output for controller tests. Clones of a
//! [`MockRenderStream`] share their recording, so a test can keep one clone
//! and hand the other to the controller.

use super::{EventStream, RenderStream, TerminalSize};
use anyhow::Result;
use crossterm::event::Event;
use regex::Regex;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

/// Pre-programmed event source
#[derive(Debug, Default)]
pub struct MockEventStream {
    events: VecDeque<Event>,
}

impl MockEventStream {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventStream for MockEventStream {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("No events available"))
    }
}

/// Recorded render command
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    ClearScreen,
    HideCursor,
    ShowCursor,
    EnterAlternateScreen,
    LeaveAlternateScreen,
    EnableRawMode,
    DisableRawMode,
    Write(Vec<u8>),
    Flush,
}

#[derive(Debug, Default)]
struct Recording {
    commands: Vec<RenderCommand>,
    output: Vec<u8>,
}

/// Render stream that records everything written to it
#[derive(Debug, Clone)]
pub struct MockRenderStream {
    recording: Arc<Mutex<Recording>>,
    terminal_size: TerminalSize,
}

fn escape_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("escape pattern is valid"))
}

impl MockRenderStream {
    pub fn new() -> Self {
        Self::with_size((80, 24))
    }

    pub fn with_size(size: TerminalSize) -> Self {
        Self {
            recording: Arc::new(Mutex::new(Recording::default())),
            terminal_size: size,
        }
    }

    fn recording(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_commands(&self) -> Vec<RenderCommand> {
        self.recording().commands.clone()
    }

    pub fn has_command(&self, command: &RenderCommand) -> bool {
        self.recording().commands.contains(command)
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        let mut recording = self.recording();
        recording.commands.clear();
        recording.output.clear();
    }

    /// Raw bytes written, escape sequences included
    pub fn get_buffer_string(&self) -> String {
        String::from_utf8_lossy(&self.recording().output).into_owned()
    }

    /// Written text with CSI sequences removed
    pub fn printed_text(&self) -> String {
        escape_pattern()
            .replace_all(&self.get_buffer_string(), "")
            .into_owned()
    }
}

impl Write for MockRenderStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut recording = self.recording();
        recording.output.extend_from_slice(buf);
        recording.commands.push(RenderCommand::Write(buf.to_vec()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.recording().commands.push(RenderCommand::Flush);
        Ok(())
    }
}

impl RenderStream for MockRenderStream {
    fn clear_screen(&mut self) -> Result<()> {
        let mut recording = self.recording();
        recording.commands.push(RenderCommand::ClearScreen);
        recording.output.clear();
        Ok(())
    }

    fn hide_cursor(&mut self) -> Result<()> {
        self.recording().commands.push(RenderCommand::HideCursor);
        Ok(())
    }

    fn show_cursor(&mut self) -> Result<()> {
        self.recording().commands.push(RenderCommand::ShowCursor);
        Ok(())
    }

    fn get_size(&self) -> Result<TerminalSize> {
        Ok(self.terminal_size)
    }

    fn enter_alternate_screen(&mut self) -> Result<()> {
        self.recording()
            .commands
            .push(RenderCommand::EnterAlternateScreen);
        Ok(())
    }

    fn leave_alternate_screen(&mut self) -> Result<()> {
        self.recording()
            .commands
            .push(RenderCommand::LeaveAlternateScreen);
        Ok(())
    }

    fn enable_raw_mode(&mut self) -> Result<()> {
        self.recording().commands.push(RenderCommand::EnableRawMode);
        Ok(())
    }

    fn disable_raw_mode(&mut self) -> Result<()> {
        self.recording().commands.push(RenderCommand::DisableRawMode);
        Ok(())
    }
}

impl Default for MockRenderStream {
    fn default() -> Self {
        Self::new()
    }
}
