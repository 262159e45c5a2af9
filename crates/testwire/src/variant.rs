//! Variant resolution.
//!
//! Resolving a node against a live element walks its polymorphism chain:
//! the selector picks a variant, the variant's layer is merged over what
//! has been resolved so far, and any nested polymorphism on the chosen
//! variant is resolved next. Resolution happens on every lookup and is
//! never cached, so a node whose element changes type re-resolves.

use std::fmt;

use crate::element::Element;
use crate::result::{WiringError, WiringResult};
use crate::scope::Scope;
use crate::serialize::SerializeScope;
use crate::wiring::{Children, ExtendFn, Layer, SerializeFn, Variant, VariantSerializeFn, WiringNode};

/// Longest allowed variant chain; anything deeper is treated as a cycle
pub const MAX_VARIANT_DEPTH: usize = 32;

/// Effective node after merging the selected variants over the base layer
#[derive(Clone, Default)]
pub struct ResolvedNode {
    children: Children,
    extends: Vec<ExtendFn>,
    serialize: Option<SerializeFn>,
    variant_serializers: Vec<VariantSerializeFn>,
    variant_path: Vec<String>,
}

impl fmt::Debug for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedNode")
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("extends", &self.extends.len())
            .field("serialize", &self.serialize.is_some())
            .field("variant_serializers", &self.variant_serializers.len())
            .field("variant_path", &self.variant_path)
            .finish()
    }
}

impl ResolvedNode {
    fn from_layer(layer: &Layer) -> Self {
        Self {
            children: layer.children.clone(),
            extends: layer.extend.iter().cloned().collect(),
            serialize: layer.serialize.clone(),
            variant_serializers: Vec::new(),
            variant_path: Vec::new(),
        }
    }

    fn apply(&mut self, key: &str, variant: &Variant) {
        if let Some(extend) = &variant.extend {
            self.extends.push(extend.clone());
        }
        if let Some(children) = &variant.children {
            self.children
                .extend(children.iter().map(|(name, node)| (name.clone(), node.clone())));
        }
        if let Some(serialize) = &variant.serialize {
            self.variant_serializers.push(serialize.clone());
        }
        self.variant_path.push(key.to_string());
    }

    /// Effective children, variant children winning
    #[must_use]
    pub const fn children(&self) -> &Children {
        &self.children
    }

    /// Selected variant keys, outermost first
    #[must_use]
    pub fn variant_path(&self) -> &[String] {
        &self.variant_path
    }

    /// Number of extend layers
    #[must_use]
    pub fn extend_layers(&self) -> usize {
        self.extends.len()
    }

    /// Whether any layer serializes
    #[must_use]
    pub fn has_serializer(&self) -> bool {
        self.serialize.is_some() || !self.variant_serializers.is_empty()
    }

    /// Layer the extend actions over `scope`, base layer first.
    ///
    /// Each layer sees the scope composed by the layers before it.
    #[must_use]
    pub fn apply_extends(&self, element: &Element, scope: Scope) -> Scope {
        self.extends.iter().fold(scope, |scope, extend| {
            let actions = extend(element, &scope);
            scope.with_actions(actions)
        })
    }

    /// Run the serializer chain; `None` when no layer serializes
    #[must_use]
    pub fn serialize(&self, element: &Element, scope: &SerializeScope) -> Option<String> {
        let base = self.serialize.as_ref().map(|serialize| serialize(element, scope));
        self.variant_serializers
            .iter()
            .fold(base, |base, serialize| {
                Some(serialize(element, scope, base.as_deref()))
            })
    }
}

/// Resolve `node` against its live element
pub fn resolve_node(element: &Element, node: &WiringNode, scope: &Scope) -> WiringResult<ResolvedNode> {
    let shape = node.shape();
    let mut resolved = ResolvedNode::from_layer(shape.base());
    let mut polymorphism = shape.polymorphism();

    while let Some(current) = polymorphism {
        let Some(key) = (current.selector)(element, scope) else {
            break;
        };
        if resolved.variant_path.len() >= MAX_VARIANT_DEPTH {
            return Err(WiringError::VariantDepthExceeded {
                max: MAX_VARIANT_DEPTH,
            });
        }
        let variant = current
            .variants
            .get(&key)
            .ok_or_else(|| WiringError::UnknownVariant {
                variant: key.clone(),
            })?;
        tracing::trace!(element = %element, variant = %key, "variant selected");
        resolved.apply(&key, variant);
        polymorphism = variant.polymorphism.as_ref();
    }

    Ok(resolved)
}
