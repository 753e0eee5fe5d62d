//! # Event Listeners
//!
//! Two tables decide what a key does inside a pager:
//!
//! - plain listeners: `KeyEvent → action()`
//! - annotation listeners: `KeyEvent → class → action(line context)`
//!
//! Dispatch prefers annotation listeners. The annotations of the cursor line
//! are scanned in their reported order and the first one whose class has a
//! handler for the key fires. Only when none fires is the plain listener
//! consulted. At most one action runs per key event.

use crate::pager::buffer::Annotation;
use crate::pager::context::Context;
use crate::pager::events::{KeyEvent, KeyParseError, PagerAction};
use crossterm::event::KeyCode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Zero-argument action bound to a key
pub type Action = Arc<dyn Fn() -> Vec<PagerAction> + Send + Sync>;

/// Action bound to a key and an annotation class, called with the line context
pub type AnnotationAction = Arc<dyn Fn(&Context) -> Vec<PagerAction> + Send + Sync>;

/// Listener tables of one pager
#[derive(Clone, Default)]
pub struct Listeners {
    plain: HashMap<KeyEvent, Action>,
    annotation: HashMap<KeyEvent, HashMap<String, AnnotationAction>>,
}

/// Action that always emits the same request
fn emit(action: PagerAction) -> impl Fn() -> Vec<PagerAction> + Send + Sync + 'static {
    move || vec![action.clone()]
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables pre-filled with the navigation bindings every pager has
    pub fn with_defaults() -> Self {
        let mut listeners = Self::new();
        listeners.add_default_listeners();
        listeners
    }

    /// Bind a plain action; re-registering a key replaces the old action
    pub fn register_listener<F>(&mut self, key: KeyEvent, action: F)
    where
        F: Fn() -> Vec<PagerAction> + Send + Sync + 'static,
    {
        self.plain.insert(key, Arc::new(action));
    }

    /// Bind one action to `key` for each of the given annotation classes
    pub fn register_annotation_listener<S, F>(&mut self, key: KeyEvent, classes: &[S], action: F)
    where
        S: AsRef<str>,
        F: Fn(&Context) -> Vec<PagerAction> + Send + Sync + 'static,
    {
        let action: AnnotationAction = Arc::new(action);
        let by_class = self.annotation.entry(key).or_default();
        for class in classes {
            by_class.insert(class.as_ref().to_string(), Arc::clone(&action));
        }
    }

    /// [`Listeners::register_listener`] with the key given in notation form
    pub fn add_event_listener<F>(&mut self, notation: &str, action: F) -> Result<(), KeyParseError>
    where
        F: Fn() -> Vec<PagerAction> + Send + Sync + 'static,
    {
        self.register_listener(KeyEvent::parse(notation)?, action);
        Ok(())
    }

    /// [`Listeners::register_annotation_listener`] with the key given in notation form
    pub fn add_annotation_event_listener<S, F>(
        &mut self,
        notation: &str,
        classes: &[S],
        action: F,
    ) -> Result<(), KeyParseError>
    where
        S: AsRef<str>,
        F: Fn(&Context) -> Vec<PagerAction> + Send + Sync + 'static,
    {
        self.register_annotation_listener(KeyEvent::parse(notation)?, classes, action);
        Ok(())
    }

    /// Whether anything at all is bound to `key`
    pub fn is_bound(&self, key: &KeyEvent) -> bool {
        self.plain.contains_key(key) || self.annotation.contains_key(key)
    }

    /// Run the listener selected for `key` given the cursor line's annotations.
    ///
    /// Returns `None` when nothing fired.
    pub fn dispatch(
        &self,
        key: &KeyEvent,
        annotations: &[&Annotation],
    ) -> Option<Vec<PagerAction>> {
        if let Some(by_class) = self.annotation.get(key) {
            let selected = annotations
                .iter()
                .find_map(|a| by_class.get(a.class()).map(|action| (a.class(), action)));
            if let Some((class, action)) = selected {
                let context = Context::from_annotations(annotations.iter().copied());
                tracing::debug!("{} dispatched to annotation listener for '{}'", key, class);
                return Some(action(&context));
            }
        }

        let action = self.plain.get(key)?;
        tracing::debug!("{} dispatched to plain listener", key);
        Some(action())
    }

    /// Navigation bindings
    ///
    /// | key          | action            |
    /// |--------------|-------------------|
    /// | `C-r`        | reload            |
    /// | `j`, `down`  | cursor down       |
    /// | `k`, `up`    | cursor up         |
    /// | `C-e`        | scroll down       |
    /// | `C-y`        | scroll up         |
    /// | `pgdn`       | page down         |
    /// | `pgup`       | page up           |
    /// | `g`          | first line        |
    /// | `S-g`        | last line         |
    pub fn add_default_listeners(&mut self) {
        self.register_listener(KeyEvent::ctrl('r'), emit(PagerAction::Reload));
        self.register_listener(KeyEvent::char('j'), emit(PagerAction::CursorDown));
        self.register_listener(KeyEvent::key(KeyCode::Down), emit(PagerAction::CursorDown));
        self.register_listener(KeyEvent::char('k'), emit(PagerAction::CursorUp));
        self.register_listener(KeyEvent::key(KeyCode::Up), emit(PagerAction::CursorUp));
        self.register_listener(KeyEvent::ctrl('e'), emit(PagerAction::ScrollDown));
        self.register_listener(KeyEvent::ctrl('y'), emit(PagerAction::ScrollUp));
        self.register_listener(KeyEvent::key(KeyCode::PageDown), emit(PagerAction::PageDown));
        self.register_listener(KeyEvent::key(KeyCode::PageUp), emit(PagerAction::PageUp));
        self.register_listener(KeyEvent::char('g'), emit(PagerAction::CursorFirstLine));
        self.register_listener(KeyEvent::shift('g'), emit(PagerAction::CursorLastLine));
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut plain: Vec<String> = self.plain.keys().map(ToString::to_string).collect();
        plain.sort();
        let mut annotation: Vec<String> = self
            .annotation
            .iter()
            .flat_map(|(key, by_class)| by_class.keys().map(move |class| format!("{key}.{class}")))
            .collect();
        annotation.sort();
        f.debug_struct("Listeners")
            .field("plain", &plain)
            .field("annotation", &annotation)
            .finish()
    }
}
