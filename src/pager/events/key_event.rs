//! # Key Events
//!
//! Normalized key identity used as the lookup key of listener tables, plus the
//! compact textual notation (`C-r`, `S-g`, `pgdn`, `j`) bindings are written in.
//!
//! Terminals report the same physical key in more than one way: `Shift+g`
//! arrives as `'G'` with or without the SHIFT bit, `?` may carry SHIFT, and
//! crossterm attaches press/release state. [`KeyEvent::new`] folds all of
//! these into a single canonical value so that exact `Hash`/`Eq` lookups work.

use crossterm::event::{KeyCode, KeyModifiers};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Modifiers that take part in key identity
const RELEVANT_MODIFIERS: KeyModifiers = KeyModifiers::SHIFT
    .union(KeyModifiers::CONTROL)
    .union(KeyModifiers::ALT);

/// Named keys accepted by the notation, in display preference order
const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("down", KeyCode::Down),
    ("up", KeyCode::Up),
    ("left", KeyCode::Left),
    ("right", KeyCode::Right),
    ("pgdn", KeyCode::PageDown),
    ("pgup", KeyCode::PageUp),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
    ("enter", KeyCode::Enter),
    ("esc", KeyCode::Esc),
    ("tab", KeyCode::Tab),
    ("backtab", KeyCode::BackTab),
    ("space", KeyCode::Char(' ')),
    ("backspace", KeyCode::Backspace),
    ("delete", KeyCode::Delete),
    ("insert", KeyCode::Insert),
];

/// Error returned for malformed key notation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key notation")]
    Empty,
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
}

/// Canonical key identity: key code plus control/shift/alt modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyEvent {
    /// Create a normalized key event
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers = modifiers & RELEVANT_MODIFIERS;
        let code = match code {
            KeyCode::Char(c) if c.is_uppercase() => {
                modifiers |= KeyModifiers::SHIFT;
                let mut lower = c.to_lowercase();
                match (lower.next(), lower.next()) {
                    (Some(l), None) => KeyCode::Char(l),
                    _ => KeyCode::Char(c),
                }
            }
            KeyCode::Char(c) if !c.is_lowercase() => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::Char(c)
            }
            KeyCode::BackTab => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::BackTab
            }
            other => other,
        };
        Self { code, modifiers }
    }

    /// Plain character key
    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    /// Control + character
    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Shift + character
    pub fn shift(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::SHIFT)
    }

    /// Key without modifiers
    pub fn key(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    /// Parse the compact notation, e.g. `C-r`, `S-g`, `M-x`, `pgdn`, `j`
    pub fn parse(notation: &str) -> Result<Self, KeyParseError> {
        if notation.is_empty() {
            return Err(KeyParseError::Empty);
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut rest = notation;
        loop {
            let mut chars = rest.chars();
            let prefix = match (chars.next(), chars.next(), chars.next()) {
                (Some('C'), Some('-'), Some(_)) => KeyModifiers::CONTROL,
                (Some('S'), Some('-'), Some(_)) => KeyModifiers::SHIFT,
                (Some('M'), Some('-'), Some(_)) => KeyModifiers::ALT,
                _ => break,
            };
            modifiers |= prefix;
            rest = &rest[2..];
        }

        let mut chars = rest.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::Char(c),
            _ => named_key(rest).ok_or_else(|| KeyParseError::UnknownKey(rest.to_string()))?,
        };

        Ok(Self::new(code, modifiers))
    }

    pub fn code(&self) -> KeyCode {
        self.code
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }
}

fn named_key(name: &str) -> Option<KeyCode> {
    if let Some((_, code)) = NAMED_KEYS.iter().find(|(n, _)| *n == name) {
        return Some(*code);
    }
    let number = name.strip_prefix('f')?.parse::<u8>().ok()?;
    (1..=12).contains(&number).then_some(KeyCode::F(number))
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("C-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("M-")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("S-")?;
        }
        if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, code)| *code == self.code) {
            return f.write_str(name);
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::F(n) => write!(f, "f{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}
