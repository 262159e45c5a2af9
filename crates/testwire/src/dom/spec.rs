//! Declarative element fixtures for [`MemoryDom`](super::MemoryDom).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::MemoryDom;
use crate::element::{DomEvent, Element, TEST_ID_ATTRIBUTE};

/// Event listener attached to an element.
///
/// Receives the DOM, the element the listener is registered on and the
/// event. Listeners run without the DOM lock held and may mutate the tree.
pub type Listener = Arc<dyn Fn(&MemoryDom, &Element, &DomEvent) + Send + Sync>;

/// Builder describing an element subtree to mount
#[derive(Clone)]
pub struct ElementSpec {
    pub(crate) tag: String,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) text: String,
    pub(crate) value: Option<String>,
    pub(crate) children: Vec<ElementSpec>,
    pub(crate) listeners: Vec<(String, Listener)>,
}

impl fmt::Debug for ElementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSpec")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("text", &self.text)
            .field("children", &self.children)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ElementSpec {
    /// Create an element with a tag name
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            value: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an attribute only when `value` is present
    #[must_use]
    pub fn attr_opt(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    /// Set the `data-testid` attribute
    #[must_use]
    pub fn test_id(self, id: impl Into<String>) -> Self {
        self.attr(TEST_ID_ATTRIBUTE, id)
    }

    /// Set the element's own text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the initial form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Append a child
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a child when present
    #[must_use]
    pub fn child_opt(self, child: Option<Self>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }

    /// Listen for an event type (`"click"`, `"focus"`, ...)
    #[must_use]
    pub fn on<F>(mut self, event_type: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&MemoryDom, &Element, &DomEvent) + Send + Sync + 'static,
    {
        self.listeners.push((event_type.into(), Arc::new(listener)));
        self
    }

    /// Listen for clicks
    #[must_use]
    pub fn on_click<F>(self, listener: F) -> Self
    where
        F: Fn(&MemoryDom, &Element) + Send + Sync + 'static,
    {
        self.on("click", move |dom, element, _| listener(dom, element))
    }

    /// Tag name
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}
