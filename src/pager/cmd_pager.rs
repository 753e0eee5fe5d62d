//! # Command Pager
//!
//! A pager over the output of one shell command. It owns the cursor/scroll
//! state, its listener tables and exactly one live generation, a running
//! [`ShellCommand`] paired with the [`Buffer`] reading it.
//!
//! ## Frame
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │ git log --oneline                            3 12/240    │ ← header
//!  │ > 1a2b3c4 fix reload                                     │ ← cursor row
//!  │   9f8e7d6 add modes                                      │
//!  │   ...                                                    │
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Key handling and drawing each hold the buffer lock for their whole
//! duration, so a frame and a dispatch always see one consistent snapshot.

use crate::pager::buffer::Buffer;
use crate::pager::context::Context;
use crate::pager::events::{KeyEvent, PagerAction};
use crate::pager::geometry::{PagerLayout, Rect};
use crate::pager::listeners::Listeners;
use crate::pager::modes::{Mode, ModeRegistry};
use crate::pager::process::{ProcessError, ShellCommand};
use crate::pager::views;
use crate::pager::viewport::Viewport;
use crossterm::style::ContentStyle;
use std::io::{self, Write};
use std::sync::Arc;

/// Columns left of the output text: padding, marker, padding
const TEXT_COLUMN: usize = 3;
const MARKER_COLUMN: usize = 1;
const HEADER_TEXT_COLUMN: usize = 1;

/// A running command and the buffer consuming its output
struct Generation {
    command: ShellCommand,
    buffer: Buffer,
}

impl Generation {
    /// Kill the process tree and hand the buffer off for joining
    fn retire(mut self) {
        self.command.close();
        self.buffer.retire();
    }
}

pub struct Pager {
    modes: Vec<Arc<dyn Mode>>,
    command_template: String,
    command: String,
    shell: Option<String>,
    context: Context,
    listeners: Listeners,
    generation: Option<Generation>,
    viewport: Viewport,
    layout: PagerLayout,
    requests: Vec<PagerAction>,
}

impl Pager {
    /// Start `command_template` with the named modes applied.
    ///
    /// Unknown mode names are skipped. Fails only when the command cannot be
    /// started, in which case no pager exists.
    pub fn new(
        registry: &ModeRegistry,
        mode_names: &str,
        command_template: impl Into<String>,
        context: Context,
    ) -> Result<Self, ProcessError> {
        Self::build(registry, mode_names, command_template.into(), context, None)
    }

    /// Like [`Pager::new`], running every invocation through `shell`
    pub fn with_shell(
        registry: &ModeRegistry,
        mode_names: &str,
        command_template: impl Into<String>,
        context: Context,
        shell: impl Into<String>,
    ) -> Result<Self, ProcessError> {
        Self::build(
            registry,
            mode_names,
            command_template.into(),
            context,
            Some(shell.into()),
        )
    }

    fn build(
        registry: &ModeRegistry,
        mode_names: &str,
        command_template: String,
        context: Context,
        shell: Option<String>,
    ) -> Result<Self, ProcessError> {
        let modes = registry.resolve(mode_names);
        let mut listeners = Listeners::with_defaults();
        for mode in &modes {
            mode.add_event_listeners(&context, &mut listeners);
        }

        let mut pager = Self {
            modes,
            command_template,
            command: String::new(),
            shell,
            context,
            listeners,
            generation: None,
            viewport: Viewport::new(0),
            layout: PagerLayout::default(),
            requests: Vec::new(),
        };
        pager.run_command()?;
        Ok(pager)
    }

    fn run_command(&mut self) -> Result<(), ProcessError> {
        self.command = self.context.interpolate(&self.command_template);
        let mut command = match &self.shell {
            Some(shell) => ShellCommand::with_shell(self.command.as_str(), shell.as_str()),
            None => ShellCommand::new(self.command.as_str()),
        };
        let stream = command.start()?;

        let mut buffer = Buffer::new(stream);
        for mode in &self.modes {
            for annotator in mode.init_annotators(&self.context) {
                buffer.annotate_with(annotator);
            }
        }

        self.generation = Some(Generation { command, buffer });
        tracing::debug!("pager running `{}`", self.command);
        Ok(())
    }

    /// Replace the running generation with a fresh invocation of the command.
    ///
    /// Listener registrations survive. On failure the pager is left without
    /// a generation and shows nothing until the next successful reload.
    pub fn reload(&mut self) -> Result<(), ProcessError> {
        tracing::debug!("reloading `{}`", self.command);
        self.stop();
        self.run_command().inspect_err(|err| {
            tracing::error!("reload of `{}` failed: {}", self.command, err);
        })
    }

    /// Retire the current generation, if any, and return to the top
    pub fn stop(&mut self) {
        if let Some(generation) = self.generation.take() {
            generation.retire();
        }
        self.viewport.reset();
    }

    pub fn is_running(&self) -> bool {
        self.generation.is_some()
    }

    pub fn register_listener<F>(&mut self, key: KeyEvent, action: F)
    where
        F: Fn() -> Vec<PagerAction> + Send + Sync + 'static,
    {
        self.listeners.register_listener(key, action);
    }

    pub fn register_annotation_listener<S, F>(&mut self, key: KeyEvent, classes: &[S], action: F)
    where
        S: AsRef<str>,
        F: Fn(&Context) -> Vec<PagerAction> + Send + Sync + 'static,
    {
        self.listeners
            .register_annotation_listener(key, classes, action);
    }

    /// Dispatch a key against the listener tables and the cursor line.
    ///
    /// Returns whether a listener fired. Requests meant for the controller
    /// are queued for [`Pager::take_requests`].
    pub fn handle_event(&mut self, key: &KeyEvent) -> Result<bool, ProcessError> {
        let mut reload = false;
        let handled = {
            let view = self.generation.as_ref().map(|g| g.buffer.lock());
            let total = view.as_ref().map_or(0, |v| v.num_lines());
            let annotations = view
                .as_ref()
                .map(|v| v.annotations_for_line(self.viewport.cursor_line()))
                .unwrap_or_default();

            match self.listeners.dispatch(key, &annotations) {
                Some(actions) => {
                    for action in actions {
                        match action {
                            PagerAction::Reload => reload = true,
                            action if action.is_forwarded() => self.requests.push(action),
                            action => apply_action(&mut self.viewport, &action, total),
                        }
                    }
                    true
                }
                None => false,
            }
        };

        // the buffer that owned the lock is replaced, so this waits for the guard to drop
        if reload {
            self.reload()?;
        }
        Ok(handled)
    }

    /// Requests queued for the controller since the last call
    pub fn take_requests(&mut self) -> Vec<PagerAction> {
        std::mem::take(&mut self.requests)
    }

    /// Assign the screen box; the header takes one row, content the rest
    pub fn set_rect(&mut self, rect: Rect) {
        self.layout = PagerLayout::new(rect);
        let total = self.total_lines();
        self.viewport.set_height(self.layout.content_height(), total);
    }

    /// Queue one frame of drawing commands into `out`
    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let view = self.generation.as_ref().map(|g| g.buffer.lock());
        let total = view.as_ref().map_or(0, |v| v.num_lines());
        let annotation_count = view.as_ref().map_or(0, |v| v.num_annotations());
        let cursor = self.viewport.cursor_line();

        let header = self.layout.header;
        if !header.is_empty() {
            let width = usize::from(header.width);
            let info = format!(" {} {}/{} ", annotation_count, cursor + 1, total);
            let info_offset = width.saturating_sub(views::display_width(&info));

            views::blank(out, header.left, header.top, width)?;
            views::draw_text(
                out,
                views::offset(header.left, HEADER_TEXT_COLUMN),
                header.top,
                &self.command,
                info_offset.saturating_sub(HEADER_TEXT_COLUMN + 1),
                views::header_style(),
            )?;
            views::draw_text(
                out,
                views::offset(header.left, info_offset),
                header.top,
                &info,
                width - info_offset,
                views::info_style(),
            )?;
        }

        let content = self.layout.content;
        if content.is_empty() {
            return Ok(());
        }
        let width = usize::from(content.width);
        let text_width = width.saturating_sub(TEXT_COLUMN);
        let rows = self.layout.content_height();
        let lines = view
            .as_ref()
            .map(|v| v.lines(self.viewport.scroll_offset(), rows))
            .unwrap_or_default();

        for row in 0..rows {
            let y = views::offset(content.top, row);
            views::blank(out, content.left, y, TEXT_COLUMN.min(width))?;
            let used = match lines.get(row) {
                Some(line) => views::draw_text(
                    out,
                    views::offset(content.left, TEXT_COLUMN),
                    y,
                    line,
                    text_width,
                    ContentStyle::new(),
                )?,
                None => 0,
            };
            views::blank(
                out,
                views::offset(content.left, TEXT_COLUMN + used),
                y,
                text_width - used,
            )?;
        }

        if total > 0 && width > MARKER_COLUMN {
            views::draw_text(
                out,
                views::offset(content.left, MARKER_COLUMN),
                views::offset(content.top, self.viewport.cursor_row()),
                ">",
                1,
                views::marker_style(),
            )?;
        }
        Ok(())
    }

    pub fn total_lines(&self) -> usize {
        self.generation
            .as_ref()
            .map_or(0, |g| g.buffer.lock().num_lines())
    }

    pub fn annotation_count(&self) -> usize {
        self.generation
            .as_ref()
            .map_or(0, |g| g.buffer.lock().num_annotations())
    }

    /// Whether the command's output has ended
    pub fn is_finished(&self) -> bool {
        self.generation
            .as_ref()
            .is_some_and(|g| g.buffer.lock().is_finished())
    }

    pub fn line_text(&self, index: usize) -> Option<String> {
        let generation = self.generation.as_ref()?;
        let view = generation.buffer.lock();
        view.line(index).map(str::to_string)
    }

    /// `(class, value)` pairs of a line in reported order
    pub fn line_annotations(&self, index: usize) -> Vec<(String, String)> {
        self.generation
            .as_ref()
            .map(|g| {
                g.buffer
                    .lock()
                    .annotations_for_line(index)
                    .into_iter()
                    .map(|a| (a.class().to_string(), a.value().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn cursor_line(&self) -> usize {
        self.viewport.cursor_line()
    }

    pub fn scroll_offset(&self) -> usize {
        self.viewport.scroll_offset()
    }

    /// The command as last started, placeholders filled in
    pub fn interpolated_command(&self) -> &str {
        &self.command
    }

    pub fn command_template(&self) -> &str {
        &self.command_template
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn layout(&self) -> PagerLayout {
        self.layout
    }

    /// OS id of the running command's process
    pub fn process_id(&self) -> Option<u32> {
        self.generation.as_ref().and_then(|g| g.command.id())
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        self.stop();
    }
}

fn apply_action(viewport: &mut Viewport, action: &PagerAction, total: usize) {
    match action {
        PagerAction::CursorUp => viewport.cursor_up(total),
        PagerAction::CursorDown => viewport.cursor_down(total),
        PagerAction::CursorFirstLine => viewport.first(total),
        PagerAction::CursorLastLine => viewport.last(total),
        PagerAction::ScrollUp => viewport.scroll_up(total),
        PagerAction::ScrollDown => viewport.scroll_down(total),
        PagerAction::PageUp => viewport.page_up(total),
        PagerAction::PageDown => viewport.page_down(total),
        PagerAction::MoveCursorTo(line) => viewport.move_cursor_to(*line, total),
        PagerAction::ScrollTo(offset) => viewport.scroll_to(*offset, total),
        PagerAction::Reload | PagerAction::OpenPager { .. } | PagerAction::Quit => {}
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;
    use std::time::Duration;

    async fn wait_until(pager: &Pager, condition: impl Fn(&Pager) -> bool) {
        for _ in 0..500 {
            if condition(pager) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    async fn finished_pager(command: &str, rows: u16) -> Pager {
        let mut pager = Pager::new(&ModeRegistry::new(), "", command, Context::new()).unwrap();
        pager.set_rect(Rect::full_screen(40, rows));
        wait_until(&pager, Pager::is_finished).await;
        pager
    }

    fn press(pager: &mut Pager, notation: &str) -> bool {
        pager.handle_event(&KeyEvent::parse(notation).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn navigation_keys_should_move_cursor_and_scroll() {
        let mut pager = finished_pager("seq 1 100", 11).await;
        assert_eq!(pager.total_lines(), 100);
        assert_eq!(pager.layout().content_height(), 10);

        assert!(press(&mut pager, "pgdn"));
        assert_eq!((pager.cursor_line(), pager.scroll_offset()), (10, 10));
        for _ in 0..15 {
            press(&mut pager, "j");
        }
        assert_eq!((pager.cursor_line(), pager.scroll_offset()), (25, 16));

        press(&mut pager, "S-g");
        assert_eq!(pager.cursor_line(), 99);
        press(&mut pager, "g");
        assert_eq!((pager.cursor_line(), pager.scroll_offset()), (0, 0));
    }

    #[tokio::test]
    async fn unbound_key_should_not_be_handled() {
        let mut pager = finished_pager("echo hi", 5).await;
        assert!(!press(&mut pager, "z"));
        assert!(pager.take_requests().is_empty());
    }

    #[tokio::test]
    async fn command_should_be_interpolated_from_context() {
        let context: Context = [("word", "hello")].into_iter().collect();
        let mut pager = Pager::new(&ModeRegistry::new(), "", "echo ${word}", context).unwrap();
        pager.set_rect(Rect::full_screen(40, 5));
        wait_until(&pager, Pager::is_finished).await;

        assert_eq!(pager.interpolated_command(), "echo hello");
        assert_eq!(pager.command_template(), "echo ${word}");
        assert_eq!(pager.line_text(0).as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn reload_should_restart_command_and_keep_listeners() {
        let mut pager = finished_pager("echo $$", 5).await;
        pager.register_listener(KeyEvent::char('x'), || vec![PagerAction::Quit]);
        press(&mut pager, "j");
        let first = pager.line_text(0).unwrap();

        assert!(press(&mut pager, "C-r"));
        assert_eq!(pager.cursor_line(), 0);
        wait_until(&pager, Pager::is_finished).await;
        let second = pager.line_text(0).unwrap();
        assert_ne!(first, second);

        assert!(press(&mut pager, "x"));
        assert_eq!(pager.take_requests(), vec![PagerAction::Quit]);
    }

    #[tokio::test]
    async fn annotation_listener_should_see_cursor_line_context() {
        let registry = ModeRegistry::from_ini_str(
            "[files]\nannotate.url = (https?://\\S+)\nannotate.path = (\\S+\\.rs)\n\
             bind.enter.path = [files] cat ${path}\n",
        )
        .unwrap();
        let mut pager = Pager::new(
            &registry,
            "files",
            "printf 'a\\nb\\nc\\nsee http://x src/lib.rs\\n'",
            Context::new(),
        )
        .unwrap();
        pager.set_rect(Rect::full_screen(60, 10));
        wait_until(&pager, |p| p.annotation_count() == 2).await;

        assert!(!press(&mut pager, "enter"), "line 0 has no annotations");

        pager.handle_event(&KeyEvent::key(KeyCode::Down)).unwrap();
        press(&mut pager, "j");
        press(&mut pager, "j");
        assert_eq!(
            pager.line_annotations(3),
            vec![
                ("url".to_string(), "http://x".to_string()),
                ("path".to_string(), "src/lib.rs".to_string()),
            ]
        );

        assert!(press(&mut pager, "enter"));
        let requests = pager.take_requests();
        let [PagerAction::OpenPager {
            modes,
            command,
            context,
        }] = requests.as_slice()
        else {
            panic!("unexpected requests {requests:?}");
        };
        assert_eq!(modes, "files");
        assert_eq!(command, "cat ${path}");
        assert_eq!(context.get("path"), Some("src/lib.rs"));
        assert_eq!(context.get("url"), Some("http://x"));
    }

    #[tokio::test]
    async fn render_should_draw_header_and_marker() {
        let pager = finished_pager("printf 'first\\nsecond\\n'", 4).await;
        let mut out = Vec::new();
        pager.render(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();

        assert!(written.contains("printf 'first\\nsecond\\n'"));
        assert!(written.contains(" 0 1/2 "));
        assert!(written.contains("first"));
        assert!(written.contains("second"));
        assert!(written.contains('>'));
    }

    #[tokio::test]
    async fn stop_should_drop_generation() {
        let mut pager = finished_pager("seq 1 50", 5).await;
        pager.handle_event(&KeyEvent::key(KeyCode::PageDown)).unwrap();
        assert!(pager.cursor_line() > 0);
        assert!(pager.is_running());

        pager.stop();
        assert!(!pager.is_running());
        assert_eq!(pager.total_lines(), 0);
        assert_eq!((pager.cursor_line(), pager.scroll_offset()), (0, 0));
        assert!(!press(&mut pager, "z"));
        assert!(press(&mut pager, "j"));
        assert_eq!(pager.cursor_line(), 0);
    }

    #[tokio::test]
    async fn unstartable_command_should_fail_construction() {
        let result = Pager::with_shell(
            &ModeRegistry::new(),
            "",
            "echo hi",
            Context::new(),
            "/nonexistent/shell",
        );
        let Err(err) = result else {
            panic!("pager should not exist without a process");
        };
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/shell"));
    }

    #[tokio::test]
    async fn failed_reload_should_leave_pager_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let shell = dir.path().join("sh");
        std::os::unix::fs::symlink("/bin/sh", &shell).unwrap();

        let mut pager = Pager::with_shell(
            &ModeRegistry::new(),
            "",
            "seq 1 50",
            Context::new(),
            shell.to_string_lossy(),
        )
        .unwrap();
        pager.set_rect(Rect::full_screen(40, 5));
        wait_until(&pager, Pager::is_finished).await;
        press(&mut pager, "pgdn");
        assert!(pager.cursor_line() > 0);

        std::fs::remove_file(&shell).unwrap();
        let err = pager
            .handle_event(&KeyEvent::ctrl('r'))
            .expect_err("reload should fail without a shell");

        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert!(!pager.is_running());
        assert_eq!(pager.total_lines(), 0);
        assert_eq!((pager.cursor_line(), pager.scroll_offset()), (0, 0));
    }
}
