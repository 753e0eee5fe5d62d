//! # Drawing Helpers
//!
//! Width-aware text placement on top of crossterm's queued commands. Nothing
//! here flushes; the controller flushes once per frame.

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, ContentStyle, Print, PrintStyledContent, Stylize};
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Style of the command text in the header
pub fn header_style() -> ContentStyle {
    ContentStyle::new().attribute(Attribute::Underlined)
}

/// Style of the counters in the header
pub fn info_style() -> ContentStyle {
    ContentStyle::new().attribute(Attribute::Bold)
}

/// Style of the cursor marker
pub fn marker_style() -> ContentStyle {
    ContentStyle::new().with(Color::Red)
}

/// Coordinate `distance` cells past `base` on either axis
pub fn offset(base: u16, distance: usize) -> u16 {
    base.saturating_add(u16::try_from(distance).unwrap_or(u16::MAX))
}

/// Display width of `text`
pub fn display_width(text: &str) -> usize {
    text.width()
}

/// Longest prefix of `text` that fits in `max_width` cells, and its width
pub fn truncate_to_width(text: &str, max_width: usize) -> (&str, usize) {
    let mut width = 0;
    for (index, ch) in text.char_indices() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width {
            return (&text[..index], width);
        }
        width += ch_width;
    }
    (text, width)
}

/// Draw `text` at `(x, y)` clipped to `max_width` cells; returns the cells used
pub fn draw_text<W: Write>(
    out: &mut W,
    x: u16,
    y: u16,
    text: &str,
    max_width: usize,
    style: ContentStyle,
) -> io::Result<usize> {
    let (visible, width) = truncate_to_width(text, max_width);
    if visible.is_empty() {
        return Ok(0);
    }
    queue!(out, MoveTo(x, y), PrintStyledContent(style.apply(visible)))?;
    Ok(width)
}

/// Overwrite `count` cells starting at `(x, y)` with spaces
pub fn blank<W: Write>(out: &mut W, x: u16, y: u16, count: usize) -> io::Result<()> {
    if count == 0 {
        return Ok(());
    }
    queue!(out, MoveTo(x, y), Print(" ".repeat(count)))
}
