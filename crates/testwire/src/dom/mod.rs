//! In-memory DOM engine.
//!
//! `MemoryDom` is a small element tree (tags, attributes, own text, form
//! values and listeners) that implements [`Engine`] and [`Render`]. It plays
//! the role a jsdom-backed testing library plays for browser code: fixtures
//! are mounted from [`ElementSpec`]s, listeners mutate the tree, and the
//! wiring layer queries it exactly as it would a real engine.
//!
//! Handles are cheap to clone; every clone sees the same tree.

mod spec;

pub use spec::{ElementSpec, Listener};

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::element::{DomEvent, Element, FindValue};
use crate::engine::{BuiltinKind, Engine, Render, Rendered};
use crate::result::{WiringError, WiringResult};
use crate::wait::WaitOptions;

struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    value: Option<String>,
    parent: Option<String>,
    children: Vec<String>,
    listeners: Vec<(String, Listener)>,
}

impl Node {
    fn handle(&self, id: &str) -> Element {
        Element::new(id, self.tag.clone())
    }
}

struct Tree {
    nodes: HashMap<String, Node>,
    body: String,
    focused: Option<String>,
}

impl Tree {
    fn new() -> Self {
        let body = Uuid::new_v4().to_string();
        let mut nodes = HashMap::new();
        let _ = nodes.insert(
            body.clone(),
            Node {
                tag: "body".to_string(),
                attributes: BTreeMap::new(),
                text: String::new(),
                value: None,
                parent: None,
                children: Vec::new(),
                listeners: Vec::new(),
            },
        );
        Self {
            nodes,
            body,
            focused: None,
        }
    }

    fn node(&self, element: &Element) -> WiringResult<&Node> {
        self.nodes
            .get(element.id())
            .ok_or_else(|| WiringError::engine(format!("{element} is not part of this document")))
    }

    fn node_mut(&mut self, element: &Element) -> WiringResult<&mut Node> {
        self.nodes
            .get_mut(element.id())
            .ok_or_else(|| WiringError::engine(format!("{element} is not part of this document")))
    }

    fn insert(&mut self, parent: &str, spec: ElementSpec) -> String {
        let id = Uuid::new_v4().to_string();
        let ElementSpec {
            tag,
            attributes,
            text,
            value,
            children,
            listeners,
        } = spec;
        let _ = self.nodes.insert(
            id.clone(),
            Node {
                tag,
                attributes,
                text,
                value,
                parent: Some(parent.to_string()),
                children: Vec::new(),
                listeners,
            },
        );
        let child_ids: Vec<String> = children
            .into_iter()
            .map(|child| self.insert(&id, child))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = child_ids;
        }
        id
    }

    fn drop_subtree(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            if self.focused.as_deref() == Some(id) {
                self.focused = None;
            }
            for child in node.children {
                self.drop_subtree(&child);
            }
        }
    }

    fn descendants(&self, id: &str, out: &mut Vec<String>) {
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                out.push(child.clone());
                self.descendants(child, out);
            }
        }
    }

    fn text_content(&self, id: &str) -> String {
        let mut text = String::new();
        self.collect_text(id, &mut text);
        text
    }

    fn collect_text(&self, id: &str, out: &mut String) {
        if let Some(node) = self.nodes.get(id) {
            out.push_str(&node.text);
            for child in &node.children {
                self.collect_text(child, out);
            }
        }
    }

    fn is_connected(&self, id: &str) -> bool {
        let mut current = Some(id.to_string());
        while let Some(id) = current {
            if id == self.body {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent.clone());
        }
        false
    }

    fn write_html(&self, id: &str, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{indent}<{}", node.tag);
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if let Some(value) = &node.value {
            let _ = write!(out, " value=\"{value}\"");
        }
        out.push_str(">\n");
        if !node.text.is_empty() {
            let _ = writeln!(out, "{indent}  {}", node.text);
        }
        for child in &node.children {
            self.write_html(child, depth + 1, out);
        }
        let _ = writeln!(out, "{indent}</{}>", node.tag);
    }
}

/// In-memory DOM engine
#[derive(Clone)]
pub struct MemoryDom {
    tree: Arc<RwLock<Tree>>,
    wait: WaitOptions,
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.read().nodes.len();
        f.debug_struct("MemoryDom")
            .field("nodes", &nodes)
            .field("wait", &self.wait)
            .finish()
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Create an empty document containing only `<body>`
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Arc::new(RwLock::new(Tree::new())),
            wait: WaitOptions::default(),
        }
    }

    /// Override the engine's default wait options
    #[must_use]
    pub fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().expect("dom lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().expect("dom lock poisoned")
    }

    /// The `<body>` element
    #[must_use]
    pub fn body(&self) -> Element {
        let tree = self.read();
        Element::new(tree.body.clone(), "body")
    }

    /// Append a subtree under `parent`
    pub fn mount(&self, parent: &Element, spec: ElementSpec) -> WiringResult<Element> {
        let mut tree = self.write();
        let _ = tree.node(parent)?;
        let tag = spec.tag.clone();
        let id = tree.insert(parent.id(), spec);
        tree.node_mut(parent)?.children.push(id.clone());
        Ok(Element::new(id, tag))
    }

    /// Replace `old` with a new subtree at the same position
    pub fn replace(&self, old: &Element, spec: ElementSpec) -> WiringResult<Element> {
        let mut tree = self.write();
        let parent = tree
            .node(old)?
            .parent
            .clone()
            .ok_or_else(|| WiringError::engine("cannot replace the document body"))?;
        let tag = spec.tag.clone();
        let id = tree.insert(&parent, spec);
        if let Some(slot) = tree
            .nodes
            .get_mut(&parent)
            .and_then(|p| p.children.iter_mut().find(|c| c.as_str() == old.id()))
        {
            slot.clone_from(&id);
        }
        tree.drop_subtree(old.id());
        Ok(Element::new(id, tag))
    }

    /// Detach and drop an element and its subtree
    pub fn remove(&self, element: &Element) -> WiringResult<()> {
        let mut tree = self.write();
        let parent = tree.node(element)?.parent.clone();
        if let Some(parent) = parent.and_then(|p| tree.nodes.get_mut(&p)) {
            parent.children.retain(|c| c != element.id());
        }
        tree.drop_subtree(element.id());
        Ok(())
    }

    /// Remove everything rendered into `<body>`
    pub fn cleanup(&self) {
        let mut tree = self.write();
        let body = tree.body.clone();
        let children = tree
            .nodes
            .get_mut(&body)
            .map(|b| std::mem::take(&mut b.children))
            .unwrap_or_default();
        for child in children {
            tree.drop_subtree(&child);
        }
    }

    /// Replace the element's own text
    pub fn set_text(&self, element: &Element, text: impl Into<String>) -> WiringResult<()> {
        self.write().node_mut(element)?.text = text.into();
        Ok(())
    }

    /// Set an attribute
    pub fn set_attribute(
        &self,
        element: &Element,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> WiringResult<()> {
        let _ = self
            .write()
            .node_mut(element)?
            .attributes
            .insert(name.into(), value.into());
        Ok(())
    }

    /// Remove an attribute
    pub fn remove_attribute(&self, element: &Element, name: &str) -> WiringResult<()> {
        let _ = self.write().node_mut(element)?.attributes.remove(name);
        Ok(())
    }

    /// Set the form value
    pub fn set_value(&self, element: &Element, value: impl Into<String>) -> WiringResult<()> {
        self.write().node_mut(element)?.value = Some(value.into());
        Ok(())
    }

    /// Parent element, `None` for `<body>` and detached elements
    #[must_use]
    pub fn parent(&self, element: &Element) -> Option<Element> {
        let tree = self.read();
        let parent = tree.nodes.get(element.id())?.parent.clone()?;
        tree.nodes.get(&parent).map(|node| node.handle(&parent))
    }

    /// Direct children
    #[must_use]
    pub fn children(&self, element: &Element) -> Vec<Element> {
        let tree = self.read();
        tree.nodes
            .get(element.id())
            .map(|node| {
                node.children
                    .iter()
                    .filter_map(|id| tree.nodes.get(id).map(|c| c.handle(id)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Element that currently has focus
    #[must_use]
    pub fn active_element(&self) -> Option<Element> {
        let tree = self.read();
        let id = tree.focused.clone()?;
        tree.nodes.get(&id).map(|node| node.handle(&id))
    }

    /// Indented markup of an element, for debugging failed tests
    #[must_use]
    pub fn outer_html(&self, element: &Element) -> String {
        let mut out = String::new();
        self.read().write_html(element.id(), 0, &mut out);
        out
    }

    fn select(
        &self,
        container: &Element,
        matches: impl Fn(&Node) -> bool,
    ) -> WiringResult<Vec<Element>> {
        let tree = self.read();
        let _ = tree.node(container)?;
        let mut ids = Vec::new();
        tree.descendants(container.id(), &mut ids);
        Ok(ids
            .iter()
            .filter_map(|id| {
                let node = tree.nodes.get(id)?;
                matches(node).then(|| node.handle(id))
            })
            .collect())
    }
}

impl Engine for MemoryDom {
    fn name(&self) -> &str {
        "memory-dom"
    }

    fn base_element(&self) -> Element {
        self.body()
    }

    fn query_all(
        &self,
        container: &Element,
        kind: BuiltinKind,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>> {
        match kind.attribute() {
            Some(attribute) => self.query_all_by_attribute(container, attribute, value),
            None => self.select(container, |node| {
                !node.text.is_empty() && value.matches(&node.text)
            }),
        }
    }

    fn query_all_by_attribute(
        &self,
        container: &Element,
        attribute: &str,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>> {
        self.select(container, |node| {
            value.matches_opt(node.attributes.get(attribute).map(String::as_str))
        })
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        self.read()
            .nodes
            .get(element.id())
            .and_then(|node| node.attributes.get(name).cloned())
    }

    fn text_content(&self, element: &Element) -> String {
        self.read().text_content(element.id())
    }

    fn value(&self, element: &Element) -> Option<String> {
        self.read()
            .nodes
            .get(element.id())
            .and_then(|node| node.value.clone())
    }

    fn is_connected(&self, element: &Element) -> bool {
        self.read().is_connected(element.id())
    }

    fn dispatch(&self, element: &Element, event: DomEvent) -> WiringResult<()> {
        let listeners = {
            let mut tree = self.write();
            if !tree.is_connected(element.id()) {
                return Err(WiringError::engine(format!(
                    "cannot dispatch {event} on detached {element}"
                )));
            }
            match &event {
                DomEvent::Change { value } => tree.node_mut(element)?.value = Some(value.clone()),
                DomEvent::Input { data } => tree
                    .node_mut(element)?
                    .value
                    .get_or_insert_with(String::new)
                    .push(*data),
                DomEvent::Focus => tree.focused = Some(element.id().to_string()),
                DomEvent::Blur => {
                    if tree.focused.as_deref() == Some(element.id()) {
                        tree.focused = None;
                    }
                }
                DomEvent::Click => {}
            }

            let mut path = vec![element.id().to_string()];
            if event.bubbles() {
                let mut current = tree.nodes.get(element.id()).and_then(|n| n.parent.clone());
                while let Some(id) = current {
                    current = tree.nodes.get(&id).and_then(|n| n.parent.clone());
                    path.push(id);
                }
            }
            path.iter()
                .filter_map(|id| tree.nodes.get(id).map(|node| (node.handle(id), node)))
                .flat_map(|(handle, node)| {
                    node.listeners
                        .iter()
                        .filter(|(kind, _)| kind == event.event_type())
                        .map(move |(_, listener)| (handle.clone(), Arc::clone(listener)))
                })
                .collect::<Vec<_>>()
        };

        tracing::trace!(event = %event, target = %element, listeners = listeners.len(), "dispatch");
        for (current, listener) in listeners {
            listener(self, &current, &event);
        }
        Ok(())
    }

    fn wait_options(&self) -> WaitOptions {
        self.wait
    }
}

impl Render for MemoryDom {
    type Fixture = ElementSpec;

    fn render(&self, fixture: ElementSpec) -> WiringResult<Rendered> {
        let base_element = self.body();
        let container = self.mount(&base_element, ElementSpec::new("div"))?;
        let _ = self.mount(&container, fixture)?;
        Ok(Rendered {
            container,
            base_element,
        })
    }
}
