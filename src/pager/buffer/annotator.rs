//! # Annotators
//!
//! Background producers that classify output lines. Each annotator runs as
//! its own task per buffer generation and is told to stop through an explicit
//! cancellation signal.

use regex::Regex;

/// A classified fact about one output line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Annotation {
    class: String,
    value: String,
    line: usize,
}

impl Annotation {
    pub fn new(class: impl Into<String>, value: impl Into<String>, line: usize) -> Self {
        Self {
            class: class.into(),
            value: value.into(),
            line,
        }
    }

    /// Class label, e.g. `path` or `sha`
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

/// Produces annotations for lines as they arrive
///
/// Lines are presented exactly once, in order. Annotations returned for a
/// line keep the order they are returned in.
pub trait Annotator: Send {
    fn annotate(&mut self, line: usize, text: &str) -> Vec<Annotation>;
}

impl<F> Annotator for F
where
    F: FnMut(usize, &str) -> Vec<Annotation> + Send,
{
    fn annotate(&mut self, line: usize, text: &str) -> Vec<Annotation> {
        self(line, text)
    }
}

/// Emits one annotation per regex match
///
/// The value is the first capture group when the pattern has one, otherwise
/// the whole match.
#[derive(Debug, Clone)]
pub struct RegexAnnotator {
    class: String,
    pattern: Regex,
}

impl RegexAnnotator {
    pub fn new(class: impl Into<String>, pattern: Regex) -> Self {
        Self {
            class: class.into(),
            pattern,
        }
    }
}

impl Annotator for RegexAnnotator {
    fn annotate(&mut self, line: usize, text: &str) -> Vec<Annotation> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| Annotation::new(self.class.as_str(), m.as_str(), line))
            .collect()
    }
}
