//! Snapshot serialization.
//!
//! Serialization walks the same tree as the finders, but with non-waiting
//! queries: whatever is in the DOM right now is serialized bottom-up and
//! handed to each node's serializer through a [`SerializeScope`].

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use crate::element::{Element, TEST_ID_ATTRIBUTE};
use crate::query::Multiplicity;
use crate::result::{WiringError, WiringResult};
use crate::scope::{Scope, WiringContext};
use crate::variant::resolve_node;
use crate::wiring::WiringNode;

/// Join the present parts with newlines, skipping `None`
///
/// ```
/// use testwire::combine;
///
/// assert_eq!(combine([Some("a"), None, Some("b")]), "a\nb");
/// ```
pub fn combine<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .flatten()
        .map(|part| part.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone)]
enum ChildStrings {
    One(Option<String>),
    Many(Vec<Option<String>>),
}

/// What a serializer sees: the default scope at the element plus the
/// serialized children.
///
/// Derefs to [`Scope`], so `text_content`, `get_text_content`, `attribute`
/// and friends are available directly.
#[derive(Debug, Clone)]
pub struct SerializeScope {
    scope: Scope,
    children: BTreeMap<String, ChildStrings>,
}

impl Deref for SerializeScope {
    type Target = Scope;

    fn deref(&self) -> &Scope {
        &self.scope
    }
}

impl SerializeScope {
    /// Default scope at the element
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Serialized single child, `None` if it is absent or has no serializer
    #[must_use]
    pub fn child_string(&self, name: &str) -> Option<&str> {
        match self.children.get(name)? {
            ChildStrings::One(string) => string.as_deref(),
            ChildStrings::Many(_) => None,
        }
    }

    /// Serialized multiple-match child, in document order
    #[must_use]
    pub fn child_strings(&self, name: &str) -> Vec<Option<&str>> {
        match self.children.get(name) {
            Some(ChildStrings::Many(strings)) => strings.iter().map(Option::as_deref).collect(),
            _ => Vec::new(),
        }
    }

    /// [`combine`]
    pub fn combine<I, S>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        combine(parts)
    }
}

/// Serialize `node` at `element`; `None` when no layer serializes
pub(crate) fn serialize_node(
    context: &Arc<WiringContext>,
    node: &WiringNode,
    element: &Element,
    name: &str,
) -> WiringResult<Option<String>> {
    let scope = Scope::ambient(Arc::clone(context), element.clone()).with_name(name);
    let resolved = resolve_node(element, node, &scope)?;

    let mut children = BTreeMap::new();
    for (child_name, child) in resolved.children() {
        let find = child.find_spec();
        let multiplicity = Multiplicity::from_multiple(find.multiple);
        let plan = context.registry.resolve(
            &context.engine,
            &find.kind,
            multiplicity,
            element,
            &context.base_element,
            find.from_root,
            context.wait,
        )?;
        let strings = plan
            .query(&find.value)?
            .iter()
            .map(|found| serialize_node(context, child, found, child_name))
            .collect::<WiringResult<Vec<_>>>()?;
        let strings = match multiplicity {
            Multiplicity::One => ChildStrings::One(strings.into_iter().next().flatten()),
            Multiplicity::Many => ChildStrings::Many(strings),
        };
        let _ = children.insert(child_name.clone(), strings);
    }

    let scope = SerializeScope { scope, children };
    Ok(resolved.serialize(element, &scope))
}

/// Serialize an element registered as one of the wiring's root children
pub(crate) fn serialize_root(context: &Arc<WiringContext>, element: &Element) -> WiringResult<String> {
    if !context.engine.supports_serialize() {
        return Err(WiringError::SerializationUnsupported {
            engine: context.engine.name().to_string(),
        });
    }
    let test_id = context.engine.attribute(element, TEST_ID_ATTRIBUTE);
    let (name, node) = context
        .roots
        .iter()
        .find(|(_, node)| node.find_spec().value.matches_opt(test_id.as_deref()))
        .ok_or(WiringError::NotSerializable)?;
    tracing::debug!(root = %name, element = %element, "serialize");
    Ok(serialize_node(context, node, element, name)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dom::{ElementSpec, MemoryDom};
    use crate::engine::{Engine, Render};
    use crate::wiring::{Polymorphism, Variant};
    use proptest::prelude::*;

    fn context_with(root: WiringNode) -> (Arc<WiringContext>, Element) {
        let dom = MemoryDom::new();
        let rendered = dom
            .render(
                ElementSpec::new("ul")
                    .test_id("list")
                    .attr("data-kind", "fancy")
                    .child(ElementSpec::new("li").test_id("item").text("a"))
                    .child(ElementSpec::new("li").test_id("item").text("b")),
            )
            .unwrap();
        let engine: Arc<dyn Engine> = Arc::new(dom);
        let list = engine
            .query_all_by_attribute(&rendered.container, TEST_ID_ATTRIBUTE, &"list".into())
            .unwrap()
            .remove(0);
        let mut context = WiringContext::new(engine, rendered.base_element);
        let _ = context.roots.insert("list".to_string(), Arc::new(root));
        (Arc::new(context), list)
    }

    mod combine_tests {
        use super::*;

        #[test]
        fn test_combine_skips_missing() {
            assert_eq!(combine([Some("a"), None, Some("c")]), "a\nc");
            assert_eq!(combine(Vec::<Option<String>>::new()), "");
        }

        proptest! {
            #[test]
            fn prop_combine_line_count(parts in proptest::collection::vec(proptest::option::of("[a-z]{1,8}"), 0..8)) {
                let present = parts.iter().flatten().count();
                let combined = combine(parts.clone());
                let lines = if combined.is_empty() { 0 } else { combined.lines().count() };
                prop_assert_eq!(lines, present);
            }
        }
    }

    mod node_tests {
        use super::*;

        #[test]
        fn test_children_serialized_bottom_up() {
            let root = WiringNode::new("list")
                .child(
                    "item",
                    WiringNode::new("item")
                        .multiple()
                        .serialize(|_, s| format!("- {}", s.text_content())),
                )
                .child("missing", WiringNode::new("missing").serialize(|_, _| "x".into()))
                .serialize(|_, s| {
                    let mut parts = vec![Some("list:")];
                    parts.extend(s.child_strings("item"));
                    parts.push(s.child_string("missing"));
                    s.combine(parts)
                });
            let (context, list) = context_with(root);
            assert_eq!(serialize_root(&context, &list).unwrap(), "list:\n- a\n- b");
        }

        #[test]
        fn test_variant_wraps_base() {
            let root = WiringNode::new("list")
                .serialize(|_, _| "base".to_string())
                .polymorphic(Polymorphism::by_attribute("data-kind").variant(
                    "fancy",
                    Variant::new().serialize(|_, _, base| format!("*{}*", base.unwrap_or("?"))),
                ));
            let (context, list) = context_with(root);
            assert_eq!(serialize_root(&context, &list).unwrap(), "*base*");
        }

        #[test]
        fn test_variant_without_base_serializer() {
            let root = WiringNode::new("list").polymorphic(
                Polymorphism::by_attribute("data-kind").variant(
                    "fancy",
                    Variant::new().serialize(|_, _, base| format!("base={base:?}")),
                ),
            );
            let (context, list) = context_with(root);
            assert_eq!(serialize_root(&context, &list).unwrap(), "base=None");
        }

        #[test]
        fn test_unregistered_root_not_serializable() {
            let (context, list) = context_with(WiringNode::new("list"));
            let item = context
                .engine
                .query_all_by_attribute(&list, TEST_ID_ATTRIBUTE, &"item".into())
                .unwrap()
                .remove(0);
            let err = serialize_root(&context, &item).unwrap_err();
            assert!(err
                .to_string()
                .contains("can't be serialized, make sure it's defined in wiring"));
        }
    }
}
