use crate::error::ConfigError;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// A regular expression kept as configuration text and compiled on first use.
///
/// Equality and serde use the source text, never the compiled form.
#[derive(Clone, Default)]
pub struct Pattern {
    source: String,
    compiled: OnceLock<Result<Regex, String>>,
    entire: OnceLock<Option<Regex>>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
            entire: OnceLock::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Compiled regex, or the compile error message.
    pub fn regex(&self) -> Result<&Regex, &str> {
        self.compiled
            .get_or_init(|| Regex::new(&self.source).map_err(|err| err.to_string()))
            .as_ref()
            .map_err(String::as_str)
    }

    /// Compiled regex, with a compile failure reported against a config field.
    pub fn checked(&self, section: &'static str, field: &'static str) -> Result<&Regex, ConfigError> {
        self.regex().map_err(|message| ConfigError::InvalidPattern {
            section,
            field,
            source_text: self.source.clone(),
            message: message.to_string(),
        })
    }

    /// True when the whole of `text` matches.
    pub fn matches_entire(&self, text: &str) -> bool {
        self.entire_regex().is_some_and(|regex| regex.is_match(text))
    }

    /// Capture groups of a match spanning the whole of `text`.
    pub fn captures_entire<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.entire_regex()?.captures(text)
    }

    fn entire_regex(&self) -> Option<&Regex> {
        self.entire
            .get_or_init(|| Regex::new(&format!("^(?:{})$", self.source)).ok())
            .as_ref()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::new(source)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Pattern::new)
    }
}
