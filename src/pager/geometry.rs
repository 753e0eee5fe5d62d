//! # Geometry Types
//!
//! Screen rectangles used to lay out a pager: the full box it was assigned,
//! the one-row header at its top and the content area below it.

/// A rectangle of terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(left: u16, top: u16, width: u16, height: u16) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Create an empty rectangle at the origin
    pub const fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Rectangle covering a whole terminal of the given size
    pub const fn full_screen(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Check if the rectangle covers no cells
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Split off the top `rows` rows, returning (top part, remainder)
    pub fn split_top(self, rows: u16) -> (Rect, Rect) {
        let rows = rows.min(self.height);
        let top = Rect::new(self.left, self.top, self.width, rows);
        let rest = Rect::new(
            self.left,
            self.top.saturating_add(rows),
            self.width,
            self.height - rows,
        );
        (top, rest)
    }
}

/// Layout of a pager inside its assigned box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PagerLayout {
    pub frame: Rect,
    pub header: Rect,
    pub content: Rect,
}

impl PagerLayout {
    /// Header is exactly one row, content takes everything below it
    pub fn new(frame: Rect) -> Self {
        let (header, content) = frame.split_top(1);
        Self {
            frame,
            header,
            content,
        }
    }

    /// Number of output lines that fit in the content area
    pub fn content_height(&self) -> usize {
        usize::from(self.content.height)
    }
}
