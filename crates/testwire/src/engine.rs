//! Engine - Abstract DOM Testing Backend
//!
//! Everything testwire knows about a rendered UI goes through the [`Engine`]
//! trait: scoped queries, element inspection and event dispatch. Engines
//! that can mount a fixture themselves also implement [`Render`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Engine (object safe, Arc<dyn Engine>)                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────┐        ┌────────────────────┐        │
//! │  │  MemoryDom         │        │  StoryEngine       │        │
//! │  │  (default)         │        │  (component story) │        │
//! │  │  in-memory tree    │        │  canvas scoped,    │        │
//! │  │  change events     │        │  per-key typing    │        │
//! │  └────────────────────┘        └────────────────────┘        │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::element::{DomEvent, Element, FindValue};
use crate::result::WiringResult;
use crate::wait::WaitOptions;

/// Query kinds every engine provides natively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinKind {
    /// Own text of an element
    Text,
    /// `data-testid` attribute
    TestId,
    /// `alt` attribute
    AltText,
    /// `placeholder` attribute
    PlaceholderText,
}

impl BuiltinKind {
    /// All built-in kinds, in registration order
    pub const ALL: [Self; 4] = [
        Self::Text,
        Self::TestId,
        Self::AltText,
        Self::PlaceholderText,
    ];

    /// Normalized kind name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::TestId => "TestId",
            Self::AltText => "AltText",
            Self::PlaceholderText => "PlaceholderText",
        }
    }

    /// Attribute backing this kind, `None` for text
    #[must_use]
    pub const fn attribute(&self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::TestId => Some(crate::element::TEST_ID_ATTRIBUTE),
            Self::AltText => Some("alt"),
            Self::PlaceholderText => Some("placeholder"),
        }
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Abstract engine trait
///
/// Queries only ever look at descendants of `container`, never the
/// container itself.
pub trait Engine: Send + Sync + fmt::Debug {
    /// Engine name for logs and errors
    fn name(&self) -> &str;

    /// The document-level element (`document.body`)
    fn base_element(&self) -> Element;

    /// All descendants of `container` matching a built-in kind, in document order
    fn query_all(
        &self,
        container: &Element,
        kind: BuiltinKind,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>>;

    /// All descendants of `container` whose `attribute` matches `value`
    fn query_all_by_attribute(
        &self,
        container: &Element,
        attribute: &str,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>>;

    /// Read an attribute
    fn attribute(&self, element: &Element, name: &str) -> Option<String>;

    /// Text content of the element and all of its descendants
    fn text_content(&self, element: &Element) -> String;

    /// Current form value
    fn value(&self, element: &Element) -> Option<String>;

    /// Whether the element is still attached to the document
    fn is_connected(&self, element: &Element) -> bool;

    /// Dispatch an event on the element
    fn dispatch(&self, element: &Element, event: DomEvent) -> WiringResult<()>;

    /// Type text into an element; replaces the value with one change event by default
    fn type_into(&self, element: &Element, text: &str) -> WiringResult<()> {
        self.dispatch(
            element,
            DomEvent::Change {
                value: text.to_string(),
            },
        )
    }

    /// Whether elements rendered by this engine can be serialized
    fn supports_serialize(&self) -> bool {
        true
    }

    /// Default wait options for this engine
    fn wait_options(&self) -> WaitOptions {
        WaitOptions::default()
    }
}

/// Output of a render primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Element the fixture was mounted into
    pub container: Element,
    /// Document-level element used for root-scoped lookups
    pub base_element: Element,
}

/// Engines that can mount their own fixtures
pub trait Render: Engine {
    /// What the engine knows how to render
    type Fixture;

    /// Mount a fixture and return the container
    fn render(&self, fixture: Self::Fixture) -> WiringResult<Rendered>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let names: Vec<_> = BuiltinKind::ALL.iter().map(BuiltinKind::name).collect();
        assert_eq!(names, vec!["Text", "TestId", "AltText", "PlaceholderText"]);
    }

    #[test]
    fn test_builtin_attributes() {
        assert_eq!(BuiltinKind::Text.attribute(), None);
        assert_eq!(BuiltinKind::TestId.attribute(), Some("data-testid"));
        assert_eq!(BuiltinKind::AltText.attribute(), Some("alt"));
        assert_eq!(BuiltinKind::PlaceholderText.to_string(), "PlaceholderText");
    }
}
