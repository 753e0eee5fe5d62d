//! # INI Modes
//!
//! Modes declared in a mode file, one section per mode:
//!
//! ```ini
//! [git-log]
//! annotate.sha = ^commit ([0-9a-f]{7,40})
//! bind.enter.sha = [git-show] git show ${sha}
//! bind.C-l = git log --oneline
//! reload-on.f5 = true
//! ```
//!
//! | setting                  | meaning                                              |
//! |--------------------------|------------------------------------------------------|
//! | `annotate.<class>`       | regex annotator, value is group 1 or the whole match |
//! | `bind.<key>.<class>`     | open a pager when `<key>` hits a `<class>` line      |
//! | `bind.<key>`             | open a pager when `<key>` is pressed                 |
//! | `reload-on.<key>`        | `true` binds an extra reload key                     |
//!
//! Binding values are `[modes] command template`; the mode list is optional.
//! The key part of a setting ends at the first `.`.

use crate::pager::buffer::{Annotator, RegexAnnotator};
use crate::pager::context::Context;
use crate::pager::events::{KeyEvent, KeyParseError, PagerAction};
use crate::pager::listeners::Listeners;
use crate::pager::modes::Mode;
use ini::{Ini, ParseOption};
use regex::Regex;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a mode file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read mode file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mode file: {0}")]
    Parse(#[from] ini::ParseError),
    #[error("mode '{mode}': invalid pattern for '{class}': {source}")]
    Pattern {
        mode: String,
        class: String,
        #[source]
        source: regex::Error,
    },
    #[error("mode '{mode}': bad key in '{setting}': {source}")]
    Key {
        mode: String,
        setting: String,
        #[source]
        source: KeyParseError,
    },
    #[error("mode '{mode}': '{setting}' has no command")]
    EmptyCommand { mode: String, setting: String },
    #[error("mode '{mode}': invalid value '{value}' for '{setting}'")]
    InvalidValue {
        mode: String,
        setting: String,
        value: String,
    },
    #[error("mode '{mode}': unknown setting '{setting}'")]
    UnknownSetting { mode: String, setting: String },
}

#[derive(Debug, Clone)]
struct Binding {
    key: KeyEvent,
    class: Option<String>,
    modes: String,
    command: String,
}

/// A mode read from one INI section
#[derive(Debug, Clone)]
pub struct IniMode {
    name: String,
    annotators: Vec<RegexAnnotator>,
    bindings: Vec<Binding>,
    reload_keys: Vec<KeyEvent>,
}

impl IniMode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotators: Vec::new(),
            bindings: Vec::new(),
            reload_keys: Vec::new(),
        }
    }

    /// Parse every section of `text` into a mode
    pub fn parse_all(text: &str) -> Result<Vec<Self>, ConfigError> {
        // regex values carry backslashes that must reach the regex engine untouched
        let option = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(text, option)?;

        let mut modes = Vec::new();
        for (section, properties) in ini.iter() {
            let Some(name) = section else {
                if properties.iter().next().is_some() {
                    tracing::warn!("settings outside of a mode section are ignored");
                }
                continue;
            };
            let mut mode = Self::new(name.trim());
            for (setting, value) in properties.iter() {
                mode.add_setting(setting.trim(), value.trim())?;
            }
            modes.push(mode);
        }
        Ok(modes)
    }

    /// Apply one `setting = value` line
    pub fn add_setting(&mut self, setting: &str, value: &str) -> Result<(), ConfigError> {
        if let Some(class) = setting.strip_prefix("annotate.") {
            let pattern = Regex::new(value).map_err(|source| ConfigError::Pattern {
                mode: self.name.clone(),
                class: class.to_string(),
                source,
            })?;
            self.annotators.push(RegexAnnotator::new(class, pattern));
        } else if let Some(rest) = setting.strip_prefix("bind.") {
            let (notation, class) = match rest.split_once('.') {
                Some((notation, class)) => (notation, Some(class.to_string())),
                None => (rest, None),
            };
            let key = self.parse_key(setting, notation)?;
            let (modes, command) = parse_target(value);
            if command.is_empty() {
                return Err(ConfigError::EmptyCommand {
                    mode: self.name.clone(),
                    setting: setting.to_string(),
                });
            }
            self.bindings.push(Binding {
                key,
                class,
                modes,
                command,
            });
        } else if let Some(notation) = setting.strip_prefix("reload-on.") {
            let key = self.parse_key(setting, notation)?;
            match value {
                "true" => self.reload_keys.push(key),
                "false" => {}
                _ => {
                    return Err(ConfigError::InvalidValue {
                        mode: self.name.clone(),
                        setting: setting.to_string(),
                        value: value.to_string(),
                    })
                }
            }
        } else {
            return Err(ConfigError::UnknownSetting {
                mode: self.name.clone(),
                setting: setting.to_string(),
            });
        }
        Ok(())
    }

    fn parse_key(&self, setting: &str, notation: &str) -> Result<KeyEvent, ConfigError> {
        KeyEvent::parse(notation).map_err(|source| ConfigError::Key {
            mode: self.name.clone(),
            setting: setting.to_string(),
            source,
        })
    }
}

/// Split `[modes] command` into its parts
fn parse_target(value: &str) -> (String, String) {
    let value = value.trim();
    if let Some((modes, command)) = value
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
    {
        return (modes.trim().to_string(), command.trim().to_string());
    }
    (String::new(), value.to_string())
}

impl Mode for IniMode {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_event_listeners(&self, context: &Context, listeners: &mut Listeners) {
        for key in &self.reload_keys {
            listeners.register_listener(*key, || vec![PagerAction::Reload]);
        }

        for binding in &self.bindings {
            let modes = binding.modes.clone();
            let command = binding.command.clone();
            let base = context.clone();
            match &binding.class {
                Some(class) => listeners.register_annotation_listener(
                    binding.key,
                    &[class],
                    move |line: &Context| {
                        vec![PagerAction::open(
                            modes.as_str(),
                            command.as_str(),
                            base.merged(line),
                        )]
                    },
                ),
                None => listeners.register_listener(binding.key, move || {
                    vec![PagerAction::open(
                        modes.as_str(),
                        command.as_str(),
                        base.clone(),
                    )]
                }),
            }
        }
    }

    fn init_annotators(&self, _context: &Context) -> Vec<Box<dyn Annotator>> {
        self.annotators
            .iter()
            .map(|annotator| Box::new(annotator.clone()) as Box<dyn Annotator>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pager::buffer::Annotation;
    use crossterm::event::KeyCode;

    const GIT_MODE: &str = r"
[git-log]
annotate.sha = ^commit ([0-9a-f]{7,40})
bind.enter.sha = [git-show, diff] git show ${sha}
bind.C-l = git log --oneline
reload-on.f5 = true
";

    fn git_mode() -> IniMode {
        IniMode::parse_all(GIT_MODE).unwrap().remove(0)
    }

    #[test]
    fn parse_all_should_read_every_setting() {
        let mode = git_mode();
        assert_eq!(mode.name(), "git-log");
        assert_eq!(mode.annotators.len(), 1);
        assert_eq!(mode.bindings.len(), 2);
        assert_eq!(mode.reload_keys, vec![KeyEvent::key(KeyCode::F(5))]);
    }

    #[test]
    fn annotators_should_keep_backslashes() {
        let modes = IniMode::parse_all("[nums]\nannotate.n = \\d+").unwrap();
        let mut annotators = modes[0].init_annotators(&Context::new());
        let found = annotators[0].annotate(0, "a 12 b");
        assert_eq!(found, vec![Annotation::new("n", "12", 0)]);
    }

    #[test]
    fn annotation_binding_should_merge_pager_and_line_context() {
        let mode = git_mode();
        let pager_ctx: Context = [("repo", "/src")].into_iter().collect();
        let mut listeners = Listeners::new();
        mode.add_event_listeners(&pager_ctx, &mut listeners);

        let line = [Annotation::new("sha", "abc1234", 0)];
        let refs: Vec<&Annotation> = line.iter().collect();
        let actions = listeners
            .dispatch(&KeyEvent::key(KeyCode::Enter), &refs)
            .unwrap();

        let PagerAction::OpenPager {
            modes,
            command,
            context,
        } = &actions[0]
        else {
            panic!("unexpected action {actions:?}");
        };
        assert_eq!(modes, "git-show, diff");
        assert_eq!(command, "git show ${sha}");
        assert_eq!(context.get("sha"), Some("abc1234"));
        assert_eq!(context.get("repo"), Some("/src"));
    }

    #[test]
    fn plain_binding_should_open_with_pager_context() {
        let mode = git_mode();
        let mut listeners = Listeners::new();
        mode.add_event_listeners(&Context::new(), &mut listeners);

        let actions = listeners.dispatch(&KeyEvent::ctrl('l'), &[]).unwrap();
        assert_eq!(
            actions,
            vec![PagerAction::open("", "git log --oneline", Context::new())]
        );
        assert_eq!(
            listeners.dispatch(&KeyEvent::key(KeyCode::F(5)), &[]),
            Some(vec![PagerAction::Reload])
        );
    }

    #[test]
    fn bad_settings_should_be_reported() {
        let err = IniMode::parse_all("[m]\nbind.nokey = ls").unwrap_err();
        assert!(matches!(err, ConfigError::Key { .. }));

        let err = IniMode::parse_all("[m]\nbind.x = [a]").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCommand { .. }));

        let err = IniMode::parse_all("[m]\nreload-on.x = maybe").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = IniMode::parse_all("[m]\ncolor = red").unwrap_err();
        assert_eq!(err.to_string(), "mode 'm': unknown setting 'color'");
    }

    #[test]
    fn parse_target_should_split_optional_modes() {
        assert_eq!(
            parse_target("[a,b] cat ${path}"),
            ("a,b".to_string(), "cat ${path}".to_string())
        );
        assert_eq!(parse_target("ls -l"), (String::new(), "ls -l".to_string()));
    }
}
