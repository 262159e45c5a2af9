//! Render bootstrap.
//!
//! [`get_render`] ties a [`Wiring`] to an engine and returns a
//! [`RenderHandler`]. Rendering a fixture mounts it and returns the root
//! [`Scope`], whose `find<Name>` actions walk the wiring tree.
//!
//! ```
//! use testwire::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> WiringResult<()> {
//! let wiring = Wiring::new().child("greeting", WiringNode::new("greeting"));
//! let handler = get_render(wiring, WiringConfig::default());
//! let root = handler.render(ElementSpec::new("p").test_id("greeting").text("hi"))?;
//! let greeting = root.find_one("greeting").await?;
//! assert_eq!(greeting.text_content(), "hi");
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::action::Actions;
use crate::dom::{ElementSpec, MemoryDom};
use crate::element::{Element, FindValue, TEST_ID_ATTRIBUTE};
use crate::engine::{Engine, Render, Rendered};
use crate::finder::build;
use crate::query::{QueryAllFn, QueryRegistry};
use crate::result::{WiringError, WiringResult};
use crate::scope::{GlobalFunctionsFn, Globals, Scope, WiringContext, WithinElementFunctionsFn};
use crate::serialize::{serialize_node, serialize_root};
use crate::wait::WaitOptions;
use crate::wiring::{Wiring, WiringNode};

/// Render primitive: mounts a fixture and reports where
pub type RenderFn<F> = Arc<dyn Fn(F) -> WiringResult<Rendered> + Send + Sync>;

// =============================================================================
// CONFIG
// =============================================================================

/// Configuration for [`get_render`]
pub struct WiringConfig<F> {
    engine: Arc<dyn Engine>,
    render: Option<RenderFn<F>>,
    custom_queries: Vec<(String, QueryAllFn)>,
    global_functions: Vec<GlobalFunctionsFn>,
    within_functions: Vec<WithinElementFunctionsFn>,
    wait: Option<WaitOptions>,
}

impl<F> fmt::Debug for WiringConfig<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringConfig")
            .field("engine", &self.engine.name())
            .field("render", &self.render.is_some())
            .field(
                "custom_queries",
                &self.custom_queries.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("global_functions", &self.global_functions.len())
            .field("within_functions", &self.within_functions.len())
            .field("wait", &self.wait)
            .finish()
    }
}

impl Default for WiringConfig<ElementSpec> {
    /// In-memory DOM, wait options from the environment
    fn default() -> Self {
        Self::for_engine(Arc::new(MemoryDom::new())).wait_options(WaitOptions::from_env())
    }
}

impl<F: 'static> WiringConfig<F> {
    /// Engine without a render primitive; supply one with [`WiringConfig::render`]
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            render: None,
            custom_queries: Vec::new(),
            global_functions: Vec::new(),
            within_functions: Vec::new(),
            wait: None,
        }
    }

    /// Engine that renders its own fixtures
    #[must_use]
    pub fn for_engine<E>(engine: Arc<E>) -> Self
    where
        E: Render<Fixture = F> + 'static,
    {
        let renderer = Arc::clone(&engine);
        let mut config = Self::new(engine);
        config.render = Some(Arc::new(move |fixture| renderer.render(fixture)));
        config
    }

    /// Override the render primitive
    #[must_use]
    pub fn render<R>(mut self, render: R) -> Self
    where
        R: Fn(F) -> WiringResult<Rendered> + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Register a custom query kind
    #[must_use]
    pub fn custom_query<Q>(mut self, kind: impl Into<String>, query: Q) -> Self
    where
        Q: Fn(&dyn Engine, &Element, &FindValue) -> WiringResult<Vec<Element>> + Send + Sync + 'static,
    {
        self.custom_queries.push((kind.into(), Arc::new(query)));
        self
    }

    /// Register a custom kind backed by an attribute
    #[must_use]
    pub fn attribute_query(self, kind: impl Into<String>, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        self.custom_query(kind, move |engine, container, value| {
            engine.query_all_by_attribute(container, &attribute, value)
        })
    }

    /// Custom global functions, merged into every scope
    #[must_use]
    pub fn global_functions<G>(mut self, functions: G) -> Self
    where
        G: Fn(&Globals) -> Actions + Send + Sync + 'static,
    {
        self.global_functions.push(Arc::new(functions));
        self
    }

    /// Custom within-element functions, merged into every element scope
    #[must_use]
    pub fn within_element_functions<W>(mut self, functions: W) -> Self
    where
        W: Fn(&Scope) -> Actions + Send + Sync + 'static,
    {
        self.within_functions.push(Arc::new(functions));
        self
    }

    /// Override the engine's wait options
    #[must_use]
    pub const fn wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = Some(wait);
        self
    }

    /// Backing engine
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }
}

// =============================================================================
// HANDLER
// =============================================================================

/// Renders fixtures against a wiring tree
pub struct RenderHandler<F> {
    wiring: Arc<Wiring>,
    root: WiringNode,
    engine: Arc<dyn Engine>,
    render: Option<RenderFn<F>>,
    registry: QueryRegistry,
    wait: WaitOptions,
    global_functions: Vec<GlobalFunctionsFn>,
    within_functions: Vec<WithinElementFunctionsFn>,
    base_element: RwLock<Option<Element>>,
}

impl<F> fmt::Debug for RenderHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderHandler")
            .field("wiring", &self.wiring)
            .field("engine", &self.engine.name())
            .field("kinds", &self.registry.kinds())
            .field("wait", &self.wait)
            .finish()
    }
}

/// Tie a wiring tree to an engine
#[must_use]
pub fn get_render<F>(wiring: Wiring, config: WiringConfig<F>) -> RenderHandler<F> {
    let mut registry = QueryRegistry::new();
    for (kind, query) in config.custom_queries {
        registry.register(&kind, query);
    }
    let wait = config.wait.unwrap_or_else(|| config.engine.wait_options());
    tracing::debug!(
        engine = config.engine.name(),
        roots = wiring.children().len(),
        kinds = ?registry.kinds(),
        "wiring configured"
    );
    RenderHandler {
        root: wiring.as_node(),
        wiring: Arc::new(wiring),
        engine: config.engine,
        render: config.render,
        registry,
        wait,
        global_functions: config.global_functions,
        within_functions: config.within_functions,
        base_element: RwLock::new(None),
    }
}

impl<F> RenderHandler<F> {
    fn context(&self, base_element: Element) -> Arc<WiringContext> {
        let mut context = WiringContext::new(Arc::clone(&self.engine), base_element);
        context.registry = self.registry.clone();
        context.wait = self.wait;
        context.global_functions.clone_from(&self.global_functions);
        context.within_functions.clone_from(&self.within_functions);
        context.roots = self.wiring.children().clone();
        Arc::new(context)
    }

    /// Base element of the last render, or the engine's default before any
    #[must_use]
    pub fn base_element(&self) -> Element {
        self.base_element
            .read()
            .expect("base element lock poisoned")
            .clone()
            .unwrap_or_else(|| self.engine.base_element())
    }

    /// Backing engine
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    /// The wiring tree
    #[must_use]
    pub fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// Mount a fixture and return the root scope
    pub fn render(&self, fixture: F) -> WiringResult<Scope> {
        let render = self.render.as_ref().ok_or(WiringError::NoRenderer)?;
        let rendered = render(fixture)?;
        tracing::debug!(container = %rendered.container, "rendered");
        self.scope_at(rendered)
    }

    /// Root scope over an already mounted fixture
    pub fn scope_at(&self, rendered: Rendered) -> WiringResult<Scope> {
        *self.base_element.write().expect("base element lock poisoned") =
            Some(rendered.base_element.clone());
        let context = self.context(rendered.base_element);
        build(&context, &self.root, rendered.container, None)
    }

    /// Serialize an element registered as a root child
    pub fn serialize(&self, element: &Element) -> WiringResult<String> {
        serialize_root(&self.context(self.base_element()), element)
    }

    /// One snapshot serializer per root child; empty when the engine
    /// cannot serialize
    #[must_use]
    pub fn snapshot_serializers(&self) -> Vec<SnapshotSerializer> {
        if !self.engine.supports_serialize() {
            return Vec::new();
        }
        let context = self.context(self.base_element());
        self.wiring
            .children()
            .iter()
            .map(|(name, node)| SnapshotSerializer {
                name: name.clone(),
                node: Arc::clone(node),
                context: Arc::clone(&context),
            })
            .collect()
    }
}

/// Test-runner glue for one root child: `test` recognizes its elements,
/// `print` serializes them
#[derive(Clone)]
pub struct SnapshotSerializer {
    name: String,
    node: Arc<WiringNode>,
    context: Arc<WiringContext>,
}

impl fmt::Debug for SnapshotSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotSerializer")
            .field("name", &self.name)
            .field("find", &self.node.find_spec())
            .finish()
    }
}

impl SnapshotSerializer {
    /// Root child name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `element` is this root child's element
    #[must_use]
    pub fn test(&self, element: &Element) -> bool {
        let test_id = self.context.engine.attribute(element, TEST_ID_ATTRIBUTE);
        self.node.find_spec().value.matches_opt(test_id.as_deref())
    }

    /// Serialize `element` with this root child's wiring
    pub fn print(&self, element: &Element) -> WiringResult<String> {
        Ok(serialize_node(&self.context, &self.node, element, &self.name)?.unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn wiring() -> Wiring {
        Wiring::new()
            .child(
                "input",
                WiringNode::new("input").serialize(|_, s| {
                    let focused = if s.has_attribute("data-focused") { "Focused: " } else { "" };
                    format!("[{focused}{}]", s.value().unwrap_or_default())
                }),
            )
            .extend(|_, _| Actions::new().with_sync("rootOnly", |_, _| Ok(true)))
    }

    fn input() -> ElementSpec {
        ElementSpec::new("input")
            .test_id("input")
            .on("focus", |dom, el, _| dom.set_attribute(el, "data-focused", "true").unwrap())
            .on("blur", |dom, el, _| dom.remove_attribute(el, "data-focused").unwrap())
    }

    #[tokio::test]
    async fn test_focus_type_blur_serialization() {
        let handler = get_render(wiring(), WiringConfig::default());
        let root = handler.render(input()).unwrap();
        let input = root.find_one("input").await.unwrap();
        let el = input.named("input").unwrap().clone();

        assert_eq!(handler.serialize(&el).unwrap(), "[]");
        input.focus().unwrap();
        assert_eq!(handler.serialize(&el).unwrap(), "[Focused: ]");
        input.type_into("Some stuff").unwrap();
        assert_eq!(handler.serialize(&el).unwrap(), "[Focused: Some stuff]");
        input.blur().unwrap();
        assert_eq!(handler.serialize(&el).unwrap(), "[Some stuff]");
        assert_eq!(input.test_id().as_deref(), Some("input"));
    }

    #[tokio::test]
    async fn test_root_extend_only_on_root() {
        let handler = get_render(wiring(), WiringConfig::default());
        let root = handler.render(input()).unwrap();
        assert!(root.has_function("rootOnly"));
        assert!(root.has_function("findInput"));
        let input = root.find_one("input").await.unwrap();
        assert!(!input.has_function("rootOnly"));
    }

    #[test]
    fn test_no_renderer() {
        let engine: Arc<dyn Engine> = Arc::new(MemoryDom::new());
        let handler = get_render(Wiring::new(), WiringConfig::<()>::new(engine));
        assert!(matches!(handler.render(()).unwrap_err(), WiringError::NoRenderer));
    }

    #[test]
    fn test_custom_render_override() {
        let dom = MemoryDom::new();
        let mounter = dom.clone();
        let config = WiringConfig::<&'static str>::new(Arc::new(dom)).render(move |text| {
            let body = mounter.body();
            let container = mounter.mount(&body, ElementSpec::new("section").text(text))?;
            Ok(Rendered {
                container,
                base_element: body,
            })
        });
        let root = get_render(Wiring::new(), config).render("custom").unwrap();
        assert_eq!(root.element().tag_name(), "section");
        assert_eq!(root.text_content(), "custom");
    }

    fn portal_config(dom: &MemoryDom) -> WiringConfig<ElementSpec> {
        let mounter = dom.clone();
        WiringConfig::new(Arc::new(dom.clone())).render(move |fixture: ElementSpec| {
            let body = mounter.body();
            let portal = mounter.mount(
                &body,
                ElementSpec::new("div")
                    .test_id("portal")
                    .child(ElementSpec::new("p").test_id("popup").text("inside")),
            )?;
            let _ = mounter.mount(&body, ElementSpec::new("p").test_id("popup").text("outside"))?;
            let container = mounter.mount(&portal, fixture)?;
            Ok(Rendered {
                container,
                base_element: portal,
            })
        })
    }

    fn popup_wiring() -> Wiring {
        Wiring::new().child(
            "panel",
            WiringNode::new("panel")
                .child(
                    "popup",
                    WiringNode::new("popup")
                        .from_root()
                        .serialize(|_, s| s.text_content()),
                )
                .serialize(|_, s| s.combine([s.child_string("popup")])),
        )
    }

    #[tokio::test]
    async fn test_from_root_searches_rendered_base_element() {
        let dom = MemoryDom::new();
        let handler = get_render(popup_wiring(), portal_config(&dom));
        assert_eq!(handler.base_element(), dom.body());

        let root = handler.render(ElementSpec::new("div").test_id("panel")).unwrap();
        assert_eq!(handler.base_element().tag_name(), "div");
        assert_eq!(
            root.within_base_element().by_test_id().query_all("popup").unwrap().len(),
            1
        );

        let panel = root.find_one("panel").await.unwrap();
        let popup = panel.find_one("popup").await.unwrap();
        assert_eq!(popup.text_content(), "inside");

        assert_eq!(handler.serialize(panel.element()).unwrap(), "inside");
        let serializers = handler.snapshot_serializers();
        assert_eq!(serializers[0].print(panel.element()).unwrap(), "inside");
    }

    #[test]
    fn test_snapshot_serializers() {
        let handler = get_render(wiring(), WiringConfig::default());
        let root = handler.render(input()).unwrap();
        let serializers = handler.snapshot_serializers();
        assert_eq!(serializers.len(), 1);
        assert_eq!(serializers[0].name(), "input");

        let el = root.by_test_id().get("input").unwrap();
        assert!(serializers[0].test(&el));
        assert!(!serializers[0].test(root.element()));
        assert_eq!(serializers[0].print(&el).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_scope_serialize_hook() {
        let handler = get_render(wiring(), WiringConfig::default());
        let root = handler.render(input()).unwrap();
        let el = root.by_test_id().get("input").unwrap();
        assert_eq!(root.serialize(&el).unwrap(), "[]");
        assert!(matches!(
            root.serialize(root.element()).unwrap_err(),
            WiringError::NotSerializable
        ));
    }
}
