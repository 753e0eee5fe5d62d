//! # Events Module
//!
//! Key identities that listeners are bound to and the actions listeners return.

pub mod actions;
pub mod key_event;

pub use actions::PagerAction;
pub use key_event::{KeyEvent, KeyParseError};
