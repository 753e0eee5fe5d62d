//! # Context
//!
//! String-to-string mapping used in two places: the variables a pager's
//! command template is interpolated against, and the per-line view of the
//! annotations under the cursor that annotation listeners receive.

use crate::pager::buffer::Annotation;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Matches `${name}` placeholders in command templates
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}").expect("placeholder pattern is valid")
    })
}

/// Label to value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    values: BTreeMap<String, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold annotations into a context; later annotations of a class win
    pub fn from_annotations<'a, I>(annotations: I) -> Self
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        let mut context = Self::new();
        for annotation in annotations {
            context.insert(annotation.class(), annotation.value());
        }
        context
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this context with `other`'s entries layered on top
    pub fn merged(&self, other: &Context) -> Context {
        let mut merged = self.clone();
        merged.values.extend(other.values.clone());
        merged
    }

    /// Replace `${name}` placeholders; unknown names are left as written
    pub fn interpolate(&self, template: &str) -> String {
        placeholder_pattern()
            .replace_all(template, |caps: &Captures| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut context = Self::new();
        for (k, v) in iter {
            context.insert(k, v);
        }
        context
    }
}
