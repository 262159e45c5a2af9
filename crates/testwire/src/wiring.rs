//! Wiring trees.
//!
//! A wiring tree names the elements of a rendered UI: how each one is found,
//! which children it has, which actions it adds to its scope and how it
//! turns into a snapshot string. Nodes may be polymorphic: a selector looks
//! at the live element and picks a variant whose layer is merged over the
//! base layer.
//!
//! # Example
//!
//! ```
//! use testwire::prelude::*;
//!
//! let wiring = Wiring::new().child(
//!     "counter",
//!     WiringNode::new("counter")
//!         .child("count", WiringNode::new("count"))
//!         .serialize(|_, s| format!("count: {}", s.child_string("count").unwrap_or_default())),
//! );
//! assert_eq!(wiring.children().len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::action::Actions;
use crate::element::{Element, FindValue};
use crate::query::DEFAULT_KIND;
use crate::scope::Scope;
use crate::serialize::SerializeScope;

/// Adds actions to a node's scope; sees the scope composed so far
pub type ExtendFn = Arc<dyn Fn(&Element, &Scope) -> Actions + Send + Sync>;

/// Serializes a node from its element and serialized children
pub type SerializeFn = Arc<dyn Fn(&Element, &SerializeScope) -> String + Send + Sync>;

/// Variant serializer; receives the base layer's string when there is one
pub type VariantSerializeFn =
    Arc<dyn Fn(&Element, &SerializeScope, Option<&str>) -> String + Send + Sync>;

/// Picks a variant key for a live element, `None` for "no variant"
pub type SelectorFn = Arc<dyn Fn(&Element, &Scope) -> Option<String> + Send + Sync>;

/// Child nodes by name
pub type Children = BTreeMap<String, Arc<WiringNode>>;

// =============================================================================
// FIND SPEC
// =============================================================================

/// How a node's element is located
#[derive(Debug, Clone, PartialEq)]
pub struct FindSpec {
    /// Lookup key
    pub value: FindValue,
    /// Query kind, as written (`"testId"`, `"text"`, `"iconName"`)
    pub kind: String,
    /// Node stands for zero or more siblings
    pub multiple: bool,
    /// Search below the engine's base element instead of the parent
    pub from_root: bool,
}

impl FindSpec {
    /// Find by test id, single match, scoped to the parent
    #[must_use]
    pub fn new(value: impl Into<FindValue>) -> Self {
        Self {
            value: value.into(),
            kind: DEFAULT_KIND.to_string(),
            multiple: false,
            from_root: false,
        }
    }
}

// =============================================================================
// LAYERS AND VARIANTS
// =============================================================================

/// Base layer of a node
#[derive(Clone, Default)]
pub struct Layer {
    pub(crate) children: Children,
    pub(crate) extend: Option<ExtendFn>,
    pub(crate) serialize: Option<SerializeFn>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("extend", &self.extend.is_some())
            .field("serialize", &self.serialize.is_some())
            .finish()
    }
}

/// One variant of a polymorphic node
#[derive(Clone, Default)]
pub struct Variant {
    pub(crate) extend: Option<ExtendFn>,
    pub(crate) children: Option<Children>,
    pub(crate) serialize: Option<VariantSerializeFn>,
    pub(crate) polymorphism: Option<Polymorphism>,
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field(
                "children",
                &self.children.as_ref().map(|c| c.keys().collect::<Vec<_>>()),
            )
            .field("extend", &self.extend.is_some())
            .field("serialize", &self.serialize.is_some())
            .field("polymorphism", &self.polymorphism)
            .finish()
    }
}

impl Variant {
    /// Empty variant
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend layer applied after the base layer's
    #[must_use]
    pub fn extend<F>(mut self, extend: F) -> Self
    where
        F: Fn(&Element, &Scope) -> Actions + Send + Sync + 'static,
    {
        self.extend = Some(Arc::new(extend));
        self
    }

    /// Add a child; variant children win over base children with the same name
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, node: WiringNode) -> Self {
        let _ = self
            .children
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), Arc::new(node));
        self
    }

    /// Serializer wrapping the base serializer's output
    #[must_use]
    pub fn serialize<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&Element, &SerializeScope, Option<&str>) -> String + Send + Sync + 'static,
    {
        self.serialize = Some(Arc::new(serialize));
        self
    }

    /// Nested polymorphism, resolved after this variant is applied
    #[must_use]
    pub fn polymorphic(mut self, polymorphism: Polymorphism) -> Self {
        self.polymorphism = Some(polymorphism);
        self
    }
}

/// Selector plus the variants it can pick
#[derive(Clone)]
pub struct Polymorphism {
    pub(crate) selector: SelectorFn,
    pub(crate) variants: BTreeMap<String, Variant>,
}

impl fmt::Debug for Polymorphism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polymorphism")
            .field("variants", &self.variants)
            .finish()
    }
}

impl Polymorphism {
    /// Polymorphism driven by `selector`
    #[must_use]
    pub fn new<F>(selector: F) -> Self
    where
        F: Fn(&Element, &Scope) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            selector: Arc::new(selector),
            variants: BTreeMap::new(),
        }
    }

    /// Selector reading an attribute of the element
    #[must_use]
    pub fn by_attribute(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        Self::new(move |_, scope| scope.attribute(&attribute))
    }

    /// Declare a variant
    #[must_use]
    pub fn variant(mut self, key: impl Into<String>, variant: Variant) -> Self {
        let _ = self.variants.insert(key.into(), variant);
        self
    }

    /// Declared variant keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.variants.keys().map(String::as_str)
    }
}

/// Shape of a node: plain, or polymorphic over a base layer
#[derive(Debug, Clone)]
pub enum NodeShape {
    /// No variants
    Base(Layer),
    /// Variants selected at lookup time
    Polymorphic {
        /// Layer every variant builds on
        base: Layer,
        /// Selector and variants
        polymorphism: Polymorphism,
    },
}

impl NodeShape {
    /// Base layer
    #[must_use]
    pub const fn base(&self) -> &Layer {
        match self {
            Self::Base(base) | Self::Polymorphic { base, .. } => base,
        }
    }

    fn base_mut(&mut self) -> &mut Layer {
        match self {
            Self::Base(base) | Self::Polymorphic { base, .. } => base,
        }
    }

    /// Polymorphism, if any
    #[must_use]
    pub const fn polymorphism(&self) -> Option<&Polymorphism> {
        match self {
            Self::Base(_) => None,
            Self::Polymorphic { polymorphism, .. } => Some(polymorphism),
        }
    }
}

// =============================================================================
// NODES
// =============================================================================

/// A named element in a wiring tree
#[derive(Debug, Clone)]
pub struct WiringNode {
    find: FindSpec,
    shape: NodeShape,
}

impl WiringNode {
    /// Node found by test id
    #[must_use]
    pub fn new(value: impl Into<FindValue>) -> Self {
        Self {
            find: FindSpec::new(value),
            shape: NodeShape::Base(Layer::default()),
        }
    }

    /// Query kind (`"text"`, `"altText"`, a custom kind)
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.find.kind = kind.into();
        self
    }

    /// Node stands for zero or more siblings
    #[must_use]
    pub const fn multiple(mut self) -> Self {
        self.find.multiple = true;
        self
    }

    /// Search below the engine's base element (portals, overlays)
    #[must_use]
    pub const fn from_root(mut self) -> Self {
        self.find.from_root = true;
        self
    }

    /// Add a child node
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, node: Self) -> Self {
        let _ = self
            .shape
            .base_mut()
            .children
            .insert(name.into(), Arc::new(node));
        self
    }

    /// Add actions to this node's scope
    #[must_use]
    pub fn extend<F>(mut self, extend: F) -> Self
    where
        F: Fn(&Element, &Scope) -> Actions + Send + Sync + 'static,
    {
        self.shape.base_mut().extend = Some(Arc::new(extend));
        self
    }

    /// Serializer for this node
    #[must_use]
    pub fn serialize<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&Element, &SerializeScope) -> String + Send + Sync + 'static,
    {
        self.shape.base_mut().serialize = Some(Arc::new(serialize));
        self
    }

    /// Make the node polymorphic
    #[must_use]
    pub fn polymorphic(self, polymorphism: Polymorphism) -> Self {
        let base = match self.shape {
            NodeShape::Base(base) | NodeShape::Polymorphic { base, .. } => base,
        };
        Self {
            find: self.find,
            shape: NodeShape::Polymorphic { base, polymorphism },
        }
    }

    /// Lookup description
    #[must_use]
    pub const fn find_spec(&self) -> &FindSpec {
        &self.find
    }

    /// Node shape
    #[must_use]
    pub const fn shape(&self) -> &NodeShape {
        &self.shape
    }

    /// Base-layer children
    #[must_use]
    pub const fn children(&self) -> &Children {
        &self.shape.base().children
    }
}

/// Root of a wiring tree
#[derive(Clone, Default)]
pub struct Wiring {
    children: Children,
    extend: Option<ExtendFn>,
}

impl fmt::Debug for Wiring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiring")
            .field("children", &self.children)
            .field("extend", &self.extend.is_some())
            .finish()
    }
}

impl Wiring {
    /// Empty wiring
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root child
    #[must_use]
    pub fn child(mut self, name: impl Into<String>, node: WiringNode) -> Self {
        let _ = self.children.insert(name.into(), Arc::new(node));
        self
    }

    /// Add actions to the root scope
    #[must_use]
    pub fn extend<F>(mut self, extend: F) -> Self
    where
        F: Fn(&Element, &Scope) -> Actions + Send + Sync + 'static,
    {
        self.extend = Some(Arc::new(extend));
        self
    }

    /// Root children
    #[must_use]
    pub const fn children(&self) -> &Children {
        &self.children
    }

    /// The root as a plain node (test id lookups never run on it)
    pub(crate) fn as_node(&self) -> WiringNode {
        WiringNode {
            find: FindSpec::new(""),
            shape: NodeShape::Base(Layer {
                children: self.children.clone(),
                extend: self.extend.clone(),
                serialize: None,
            }),
        }
    }
}
