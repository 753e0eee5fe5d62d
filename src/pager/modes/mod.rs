//! # Modes
//!
//! A mode bundles key bindings and annotators for a kind of output (git log,
//! grep results, ...). Pagers are created with a comma-separated list of mode
//! names which are resolved against a [`ModeRegistry`] handed in by the caller.

pub mod ini_mode;

pub use ini_mode::{ConfigError, IniMode};

use crate::pager::buffer::Annotator;
use crate::pager::context::Context;
use crate::pager::listeners::Listeners;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Supplier of listeners and annotators for a pager
pub trait Mode: Send + Sync {
    fn name(&self) -> &str;

    /// Register this mode's bindings; `context` is the pager's own context
    fn add_event_listeners(&self, context: &Context, listeners: &mut Listeners);

    /// Fresh annotators for a new buffer generation
    fn init_annotators(&self, context: &Context) -> Vec<Box<dyn Annotator>>;
}

/// Named modes available to pagers
#[derive(Clone, Default)]
pub struct ModeRegistry {
    modes: HashMap<String, Arc<dyn Mode>>,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mode, replacing any mode of the same name
    pub fn register<M: Mode + 'static>(&mut self, mode: M) {
        self.modes.insert(mode.name().to_string(), Arc::new(mode));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Mode>> {
        self.modes.get(name).cloned()
    }

    /// Mode names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Resolve `"git,grep"` into modes, skipping unknown names with a warning
    pub fn resolve(&self, mode_names: &str) -> Vec<Arc<dyn Mode>> {
        mode_names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .filter_map(|name| {
                let mode = self.get(name);
                if mode.is_none() {
                    tracing::warn!("unknown mode '{}' skipped", name);
                }
                mode
            })
            .collect()
    }

    /// Load modes from an INI file; a missing file gives an empty registry
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no mode file at {}", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let registry = Self::from_ini_str(&text)?;
        tracing::debug!("loaded {} modes from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Parse modes from INI text, one section per mode
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for mode in IniMode::parse_all(text)? {
            registry.register(mode);
        }
        Ok(registry)
    }
}

impl fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModeRegistry")
            .field("modes", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::buffer::Annotation;
    use crate::pager::events::{KeyEvent, PagerAction};
    use std::io::Write;

    struct Numbers;

    impl Mode for Numbers {
        fn name(&self) -> &str {
            "numbers"
        }

        fn add_event_listeners(&self, _context: &Context, listeners: &mut Listeners) {
            listeners.register_listener(KeyEvent::char('n'), || vec![PagerAction::CursorDown]);
        }

        fn init_annotators(&self, _context: &Context) -> Vec<Box<dyn Annotator>> {
            vec![Box::new(|line: usize, text: &str| {
                if text.chars().all(|c| c.is_ascii_digit()) {
                    vec![Annotation::new("number", text, line)]
                } else {
                    Vec::new()
                }
            })]
        }
    }

    #[test]
    fn resolve_should_skip_unknown_modes() {
        let mut registry = ModeRegistry::new();
        registry.register(Numbers);

        let modes = registry.resolve("missing, numbers,,");
        let names: Vec<&str> = modes.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["numbers"]);
        assert!(registry.resolve("").is_empty());
    }

    #[test]
    fn resolved_mode_should_register_listeners() {
        let mut registry = ModeRegistry::new();
        registry.register(Numbers);

        let mut listeners = Listeners::new();
        for mode in registry.resolve("numbers") {
            mode.add_event_listeners(&Context::new(), &mut listeners);
        }
        assert!(listeners.is_bound(&KeyEvent::char('n')));
    }

    #[test]
    fn load_should_return_empty_registry_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModeRegistry::load(dir.path().join("absent.ini")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn load_should_read_modes_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[git]\nannotate.sha = ^commit ([0-9a-f]+)\n\n[grep]\nannotate.path = ^([^:]+):"
        )
        .unwrap();

        let registry = ModeRegistry::load(file.path()).unwrap();
        assert_eq!(registry.names(), vec!["git", "grep"]);
    }

    #[test]
    fn load_should_report_bad_patterns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[broken]\nannotate.x = ([a-z]").unwrap();

        let err = ModeRegistry::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Pattern { .. }));
    }
}
