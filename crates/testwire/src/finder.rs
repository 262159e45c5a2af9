//! Wiring interpreter.
//!
//! [`build`] turns a wiring node and its element into a [`Scope`]: the
//! default functions at the element, one `find<Name>` action per effective
//! child, then the node's extend layers. Child finders locate their element
//! lazily, resolve its variant and recurse.

use async_trait::async_trait;
use std::sync::Arc;

use crate::action::{Action, Actions, Args, Outcome, Select};
use crate::element::{Element, TEST_ID_ATTRIBUTE};
use crate::query::Multiplicity;
use crate::result::{WiringError, WiringResult};
use crate::scope::{finder_name, Scope, WiringContext};
use crate::variant::resolve_node;
use crate::wiring::WiringNode;

/// Build the scope of `node` at `element`
pub(crate) fn build(
    context: &Arc<WiringContext>,
    node: &WiringNode,
    element: Element,
    name: Option<&str>,
) -> WiringResult<Scope> {
    let mut scope = Scope::ambient(Arc::clone(context), element);
    if let Some(name) = name {
        scope = scope.with_name(name);
    }
    let resolved = resolve_node(scope.element(), node, &scope)?;

    let mut finders = Actions::new();
    for (child, child_node) in resolved.children() {
        finders.insert(
            finder_name(child),
            Arc::new(ChildFinder {
                child: child.clone(),
                node: Arc::clone(child_node),
            }),
        );
    }
    let scope = scope.with_actions(finders);
    let element = scope.element().clone();
    Ok(resolved.apply_extends(&element, scope))
}

/// `find<Name>` action of one child
struct ChildFinder {
    child: String,
    node: Arc<WiringNode>,
}

#[async_trait]
impl Action for ChildFinder {
    async fn call(&self, scope: Scope, args: Args) -> WiringResult<Outcome> {
        let element = find_child(&scope, &self.child, &self.node, args.select.as_ref()).await?;
        let child = build(scope.context(), &self.node, element, Some(&self.child))?;
        Ok(child.into())
    }
}

/// Locate the element of `node` below the scope's element
pub(crate) async fn find_child(
    scope: &Scope,
    child: &str,
    node: &WiringNode,
    select: Option<&Select>,
) -> WiringResult<Element> {
    let finder = finder_name(child);
    let find = node.find_spec();
    let multiplicity = Multiplicity::from_multiple(find.multiple);
    if multiplicity == Multiplicity::Many && select.is_none() {
        return Err(WiringError::MissingSelector { finder });
    }

    let context = scope.context();
    let plan = context.registry.resolve(
        &context.engine,
        &find.kind,
        multiplicity,
        scope.element(),
        &context.base_element,
        find.from_root,
        context.wait,
    )?;
    let found = plan.find(&find.value).await?;
    tracing::debug!(
        finder = %finder,
        kind = plan.bound().kind(),
        value = %find.value,
        found = found.len(),
        "find"
    );

    match (multiplicity, select) {
        (Multiplicity::Many, Some(Select::Index(index))) => {
            let highest = found.len().saturating_sub(1);
            found
                .into_iter()
                .nth(*index)
                .ok_or(WiringError::IndexOutOfRange {
                    finder,
                    index: *index,
                    highest,
                })
        }
        (Multiplicity::Many, Some(Select::Filter(filter))) => {
            let mut matched: Vec<Element> = found
                .into_iter()
                .filter(|element| {
                    let test_id = context.engine.attribute(element, TEST_ID_ATTRIBUTE);
                    filter(element, test_id.as_deref())
                })
                .collect();
            match matched.len() {
                0 => Err(WiringError::FilterMatchedNothing { finder }),
                1 => Ok(matched.remove(0)),
                count => Err(WiringError::FilterMatchedMany { finder, count }),
            }
        }
        _ => found
            .into_iter()
            .next()
            .ok_or_else(|| plan.bound().not_found(&find.value)),
    }
}
