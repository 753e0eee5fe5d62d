//! # Application Controller
//!
//! Owns the terminal streams and a stack of pagers. The top pager receives
//! every key first; keys it leaves unhandled fall through to the controller's
//! own bindings. Requests a pager queues (open another pager, quit) are
//! applied here after each key.
//!
//! ```text
//!  EventStream ──▶ AppController ──▶ top Pager ──▶ listeners
//!                       │  ▲             │
//!                       │  └─ requests ──┘
//!                       ▼
//!                  RenderStream ◀── top Pager::render (every frame)
//! ```

use crate::pager::cmd_pager::Pager;
use crate::pager::context::Context;
use crate::pager::events::{KeyEvent, PagerAction};
use crate::pager::geometry::Rect;
use crate::pager::io::{
    EventStream, RenderStream, TerminalEventStream, TerminalRenderStream,
};
use crate::pager::modes::ModeRegistry;
use anyhow::Result;
use crossterm::event::{Event, KeyEventKind};
use std::io::{BufWriter, Stdout};
use std::time::Duration;

/// Pause between frames; output keeps streaming in meanwhile
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Controller of the full-screen pager application
pub struct AppController<ES: EventStream, RS: RenderStream> {
    registry: ModeRegistry,
    pagers: Vec<Pager>,
    event_stream: ES,
    render_stream: RS,
    screen: Rect,
    should_quit: bool,
}

impl AppController<TerminalEventStream, TerminalRenderStream<BufWriter<Stdout>>> {
    /// Controller on the real terminal
    pub fn new(
        registry: ModeRegistry,
        mode_names: &str,
        command: &str,
        context: Context,
    ) -> Result<Self> {
        Self::with_io_streams(
            registry,
            mode_names,
            command,
            context,
            TerminalEventStream::new(),
            TerminalRenderStream::new(),
        )
    }
}

impl<ES: EventStream, RS: RenderStream> AppController<ES, RS> {
    /// Controller with injected I/O streams; starts the first pager
    pub fn with_io_streams(
        registry: ModeRegistry,
        mode_names: &str,
        command: &str,
        context: Context,
        event_stream: ES,
        render_stream: RS,
    ) -> Result<Self> {
        let (width, height) = render_stream.get_size()?;
        let screen = Rect::full_screen(width, height);

        let mut pager = Pager::new(&registry, mode_names, command, context)?;
        pager.set_rect(screen);

        Ok(Self {
            registry,
            pagers: vec![pager],
            event_stream,
            render_stream,
            screen,
            should_quit: false,
        })
    }

    /// Run until quit, restoring the terminal on the way out
    pub async fn run(&mut self) -> Result<()> {
        self.initialize_terminal()?;
        let result = self.event_loop().await;
        let cleanup = self.cleanup_terminal();
        result.and(cleanup)
    }

    async fn event_loop(&mut self) -> Result<()> {
        while !self.should_quit {
            while !self.should_quit && self.event_stream.poll(Duration::ZERO)? {
                let event = self.event_stream.read()?;
                self.handle_event(event)?;
            }
            if self.should_quit {
                break;
            }
            self.render()?;
            tokio::time::sleep(FRAME_INTERVAL).await;
        }
        Ok(())
    }

    fn initialize_terminal(&mut self) -> Result<()> {
        self.render_stream.enable_raw_mode()?;
        self.render_stream.enter_alternate_screen()?;
        self.render_stream.hide_cursor()?;
        self.render_stream.clear_screen()?;
        Ok(())
    }

    fn cleanup_terminal(&mut self) -> Result<()> {
        self.render_stream.show_cursor()?;
        self.render_stream.leave_alternate_screen()?;
        self.render_stream.disable_raw_mode()?;
        Ok(())
    }

    /// Handle one input event
    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                tracing::debug!("received key event: {:?}", key);
                self.handle_key(KeyEvent::from(key));
            }
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let Some(pager) = self.pagers.last_mut() else {
            self.should_quit = true;
            return;
        };
        let outcome = pager.handle_event(&key);
        let requests = pager.take_requests();

        match outcome {
            Ok(true) => {}
            Ok(false) => self.handle_global_key(&key),
            Err(err) => {
                tracing::error!("closing pager after failed reload: {}", err);
                self.close_top_pager();
            }
        }

        for request in requests {
            self.apply_request(request);
        }
    }

    /// Bindings that apply when the top pager ignores a key
    fn handle_global_key(&mut self, key: &KeyEvent) {
        if *key == KeyEvent::char('q') {
            self.close_top_pager();
        } else if *key == KeyEvent::ctrl('c') {
            self.should_quit = true;
        }
    }

    fn apply_request(&mut self, request: PagerAction) {
        match request {
            PagerAction::OpenPager {
                modes,
                command,
                context,
            } => match Pager::new(&self.registry, &modes, command.as_str(), context) {
                Ok(mut pager) => {
                    pager.set_rect(self.screen);
                    self.pagers.push(pager);
                }
                Err(err) => tracing::error!("failed to open pager for `{}`: {}", command, err),
            },
            PagerAction::Quit => self.should_quit = true,
            other => tracing::debug!("ignoring request {:?}", other),
        }
    }

    fn close_top_pager(&mut self) {
        self.pagers.pop();
        if self.pagers.is_empty() {
            self.should_quit = true;
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.screen = Rect::full_screen(width, height);
        for pager in &mut self.pagers {
            pager.set_rect(self.screen);
        }
    }

    /// Draw the top pager and flush the frame
    pub fn render(&mut self) -> Result<()> {
        if let Some(pager) = self.pagers.last() {
            pager.render(&mut self.render_stream)?;
        }
        self.render_stream.flush()?;
        Ok(())
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn pagers(&self) -> &[Pager] {
        &self.pagers
    }

    pub fn top_pager(&self) -> Option<&Pager> {
        self.pagers.last()
    }

    pub fn top_pager_mut(&mut self) -> Option<&mut Pager> {
        self.pagers.last_mut()
    }

    pub fn screen(&self) -> Rect {
        self.screen
    }
}
