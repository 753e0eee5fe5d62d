//! Step definitions for the cucumber features
//!
//! - `setup` - terminal size, mode files and starting commands
//! - `keys` - key presses and waits
//! - `pager` - assertions on cursor, output, annotations and the pager stack

pub mod keys;
pub mod pager;
pub mod setup;
