//! # Pager Actions
//!
//! Requests produced by listeners. Listeners never touch the pager directly;
//! they describe what should happen and the pager applies the result, the same
//! way commands suggest and the controller decides.

use crate::pager::context::Context;

/// A request returned by an event listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerAction {
    /// Tear down the running command and start it again
    Reload,
    CursorUp,
    CursorDown,
    CursorFirstLine,
    CursorLastLine,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    /// Move the cursor to an absolute line (clamped)
    MoveCursorTo(usize),
    /// Scroll so the given line is at the top (clamped)
    ScrollTo(usize),
    /// Ask the controller to open another pager on top of this one
    OpenPager {
        modes: String,
        command: String,
        context: Context,
    },
    /// Ask the controller to quit
    Quit,
}

impl PagerAction {
    /// Whether the pager applies this action itself or hands it to the controller
    pub fn is_forwarded(&self) -> bool {
        matches!(self, Self::OpenPager { .. } | Self::Quit)
    }

    /// Create an open-pager request
    pub fn open(modes: impl Into<String>, command: impl Into<String>, context: Context) -> Self {
        Self::OpenPager {
            modes: modes.into(),
            command: command.into(),
            context,
        }
    }
}
