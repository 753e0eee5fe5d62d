//! # Viewport
//!
//! Cursor and scroll state of a pager over a buffer of `total` lines shown
//! through a content area `height` rows tall.
//!
//! Every mutation clamps its target and then applies exactly one correction
//! to the other coordinate so that the cursor stays on a visible row:
//!
//! ```text
//! scroll_offset <= cursor_line <= scroll_offset + height - 1
//! ```
//!
//! The corrections are plain functions of the new value and the current value
//! of the other coordinate. Cursor moves never call back into scrolling and
//! vice versa. A zero-row content area behaves like a one-row one.

/// Clamp a cursor target to `[0, total - 1]` (0 when empty)
pub fn clamp_cursor(line: usize, total: usize) -> usize {
    line.min(total.saturating_sub(1))
}

/// Clamp a scroll target to `[0, max(0, total - height)]`
pub fn clamp_scroll(offset: usize, total: usize, height: usize) -> usize {
    offset.min(total.saturating_sub(height.max(1)))
}

/// Scroll offset that keeps `cursor` visible, sliding from `scroll` as little as possible
pub fn follow_cursor(cursor: usize, scroll: usize, height: usize) -> usize {
    let last_row = height.max(1) - 1;
    if cursor < scroll {
        cursor
    } else if cursor > scroll + last_row {
        cursor - last_row
    } else {
        scroll
    }
}

/// Cursor line snapped to the nearer edge of the viewport starting at `scroll`
pub fn follow_scroll(scroll: usize, cursor: usize, height: usize) -> usize {
    let last_row = height.max(1) - 1;
    if cursor < scroll {
        scroll
    } else if cursor > scroll + last_row {
        scroll + last_row
    } else {
        cursor
    }
}

/// Cursor/scroll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    cursor_line: usize,
    scroll_offset: usize,
    height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            cursor_line: 0,
            scroll_offset: 0,
            height,
        }
    }

    pub fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    /// Content height, which is also the page size
    pub fn height(&self) -> usize {
        self.height
    }

    /// Back to the top, used when a fresh generation of output starts
    pub fn reset(&mut self) {
        self.cursor_line = 0;
        self.scroll_offset = 0;
    }

    /// Apply a new content height and restore the invariants against it
    pub fn set_height(&mut self, height: usize, total: usize) {
        self.height = height;
        self.cursor_line = clamp_cursor(self.cursor_line, total);
        let scroll = follow_cursor(self.cursor_line, self.scroll_offset, height);
        self.scroll_offset = clamp_scroll(scroll, total, height);
    }

    pub fn move_cursor_to(&mut self, line: usize, total: usize) {
        self.cursor_line = clamp_cursor(line, total);
        let scroll = follow_cursor(self.cursor_line, self.scroll_offset, self.height);
        self.scroll_offset = clamp_scroll(scroll, total, self.height);
    }

    pub fn move_cursor_by(&mut self, delta: isize, total: usize) {
        self.move_cursor_to(self.cursor_line.saturating_add_signed(delta), total);
    }

    pub fn scroll_to(&mut self, offset: usize, total: usize) {
        self.scroll_offset = clamp_scroll(offset, total, self.height);
        let cursor = follow_scroll(self.scroll_offset, self.cursor_line, self.height);
        self.cursor_line = clamp_cursor(cursor, total);
    }

    pub fn scroll_by(&mut self, delta: isize, total: usize) {
        self.scroll_to(self.scroll_offset.saturating_add_signed(delta), total);
    }

    pub fn cursor_up(&mut self, total: usize) {
        self.move_cursor_by(-1, total);
    }

    pub fn cursor_down(&mut self, total: usize) {
        self.move_cursor_by(1, total);
    }

    pub fn scroll_up(&mut self, total: usize) {
        self.scroll_by(-1, total);
    }

    pub fn scroll_down(&mut self, total: usize) {
        self.scroll_by(1, total);
    }

    pub fn page_up(&mut self, total: usize) {
        self.scroll_by(-self.page_size(), total);
    }

    pub fn page_down(&mut self, total: usize) {
        self.scroll_by(self.page_size(), total);
    }

    pub fn first(&mut self, total: usize) {
        self.move_cursor_to(0, total);
    }

    /// Requests line `total`, which the clamp turns into the last line
    pub fn last(&mut self, total: usize) {
        self.move_cursor_to(total, total);
    }

    /// Row of the cursor relative to the top of the content area
    pub fn cursor_row(&self) -> usize {
        self.cursor_line - self.scroll_offset
    }

    fn page_size(&self) -> isize {
        isize::try_from(self.height).unwrap_or(isize::MAX)
    }

    #[cfg(test)]
    fn invariant_holds(&self, total: usize) -> bool {
        let h = self.height.max(1);
        let cursor_ok = if total == 0 {
            self.cursor_line == 0
        } else {
            self.cursor_line < total
        };
        cursor_ok
            && self.scroll_offset <= total.saturating_sub(self.height)
            && self.scroll_offset <= self.cursor_line
            && self.cursor_line < self.scroll_offset + h
    }
}
