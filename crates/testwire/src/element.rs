//! Element handles, find values and DOM events.
//!
//! An [`Element`] is an opaque handle owned by an engine. Two handles are
//! the same element exactly when their ids are equal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::WiringResult;

/// Attribute used by the test-id query kind
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

/// Handle to an element living inside an engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    id: String,
    tag_name: String,
}

impl Element {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }

    /// Engine-assigned identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lower-case tag name
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} #{}>", self.tag_name, self.id)
    }
}

/// Lookup key passed to a query kind
#[derive(Debug, Clone)]
pub enum FindValue {
    /// Exact match against normalized text
    Exact(String),
    /// Regular expression match against normalized text
    Pattern(Regex),
}

impl FindValue {
    /// Create an exact find value
    #[must_use]
    pub fn exact(value: impl Into<String>) -> Self {
        Self::Exact(value.into())
    }

    /// Compile a pattern find value
    pub fn pattern(pattern: &str) -> WiringResult<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Check a candidate text against this value.
    ///
    /// The candidate is trimmed and inner whitespace collapsed first, the
    /// same normalization DOM testing libraries apply by default.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let normalized = normalize_text(candidate);
        match self {
            Self::Exact(value) => normalized == *value,
            Self::Pattern(regex) => regex.is_match(&normalized),
        }
    }

    /// Check an optional attribute value
    #[must_use]
    pub fn matches_opt(&self, candidate: Option<&str>) -> bool {
        candidate.is_some_and(|c| self.matches(c))
    }
}

impl fmt::Display for FindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "{value}"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

impl PartialEq for FindValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Exact(a), Self::Exact(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl From<&str> for FindValue {
    fn from(value: &str) -> Self {
        Self::Exact(value.to_string())
    }
}

impl From<String> for FindValue {
    fn from(value: String) -> Self {
        Self::Exact(value)
    }
}

impl From<Regex> for FindValue {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

/// Trim and collapse runs of whitespace into single spaces
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Events an engine can dispatch on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomEvent {
    /// Mouse click
    Click,
    /// Element gains focus
    Focus,
    /// Element loses focus
    Blur,
    /// Form value replaced wholesale
    Change {
        /// New value
        value: String,
    },
    /// Single character typed by a user
    Input {
        /// Typed character
        data: char,
    },
}

impl DomEvent {
    /// Event type name as used by DOM listeners
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Change { .. } => "change",
            Self::Input { .. } => "input",
        }
    }

    /// Whether the event bubbles to ancestors
    #[must_use]
    pub const fn bubbles(&self) -> bool {
        matches!(self, Self::Click | Self::Change { .. } | Self::Input { .. })
    }
}

impl fmt::Display for DomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_type())
    }
}
