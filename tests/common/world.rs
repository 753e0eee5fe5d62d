use anyhow::{bail, Result};
use crossterm::event::Event;
use cucumber::World;
use rat::io::{MockEventStream, MockRenderStream};
use rat::{AppController, Context, KeyEvent, ModeRegistry, Pager};
use std::time::Duration;

type TestController = AppController<MockEventStream, MockRenderStream>;

const WAIT_STEP: Duration = Duration::from_millis(10);
const WAIT_LIMIT: usize = 500;

/// State shared by the steps of one scenario
#[derive(World)]
#[world(init = Self::new)]
pub struct PagerWorld {
    /// Modes available to pagers started in this scenario
    pub registry: ModeRegistry,

    /// Terminal size handed to the mock render stream
    pub terminal_size: (u16, u16),

    /// Observer clone of the controller's render stream
    pub render: MockRenderStream,

    pub controller: Option<TestController>,

    /// First output line captured by a "remember" step
    pub remembered_line: Option<String>,
}

impl std::fmt::Debug for PagerWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerWorld")
            .field("registry", &self.registry)
            .field("terminal_size", &self.terminal_size)
            .field("pagers", &self.controller.as_ref().map(|c| c.pagers().len()))
            .field("remembered_line", &self.remembered_line)
            .finish()
    }
}

impl PagerWorld {
    pub fn new() -> Self {
        Self {
            registry: ModeRegistry::new(),
            terminal_size: (80, 24),
            render: MockRenderStream::new(),
            controller: None,
            remembered_line: None,
        }
    }

    /// Start the controller on `command` with the given modes
    pub fn start(&mut self, command: &str, modes: &str) -> Result<()> {
        self.render = MockRenderStream::with_size(self.terminal_size);
        let controller = AppController::with_io_streams(
            self.registry.clone(),
            modes,
            command,
            Context::new(),
            MockEventStream::empty(),
            self.render.clone(),
        )?;
        self.controller = Some(controller);
        Ok(())
    }

    pub fn controller(&self) -> &TestController {
        self.controller
            .as_ref()
            .expect("no pager was started in this scenario")
    }

    pub fn controller_mut(&mut self) -> &mut TestController {
        self.controller
            .as_mut()
            .expect("no pager was started in this scenario")
    }

    pub fn top_pager(&self) -> &Pager {
        self.controller()
            .top_pager()
            .expect("no pager is open")
    }

    /// Send a key written in binding notation, e.g. `j`, `C-r`, `pgdn`
    pub fn press(&mut self, notation: &str) -> Result<()> {
        let key = KeyEvent::parse(notation)?;
        let event = Event::Key(crossterm::event::KeyEvent::new(key.code(), key.modifiers()));
        self.controller_mut().handle_event(event)
    }

    /// Poll the top pager until `condition` holds
    pub async fn wait_for(&self, what: &str, condition: impl Fn(&Pager) -> bool) -> Result<()> {
        for _ in 0..WAIT_LIMIT {
            if self.controller().top_pager().is_some_and(&condition) {
                return Ok(());
            }
            tokio::time::sleep(WAIT_STEP).await;
        }
        bail!("timed out waiting for {what}")
    }

    /// Draw one frame and return the text it printed
    pub fn render_frame(&mut self) -> Result<String> {
        self.render.clear();
        self.controller_mut().render()?;
        Ok(self.render.printed_text())
    }
}

impl Default for PagerWorld {
    fn default() -> Self {
        Self::new()
    }
}
