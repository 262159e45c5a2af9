//! Function scopes.
//!
//! A [`Scope`] is everything a test can do at one position of the wiring
//! tree: typed engine primitives scoped to the element, the global
//! functions, per-kind families, and the named [`Actions`] (custom
//! functions, child finders and extend layers).
//!
//! Named actions are merged in this order, later layers winning on name
//! collisions:
//!
//! ```text
//! custom global < custom within-element < child finders < extend (base) < extend (variants)
//! ```
//!
//! Scopes are immutable; composing a layer produces a new scope.

use std::fmt;
use std::sync::Arc;

use crate::action::{Actions, Args, Outcome, Select};
use crate::element::{DomEvent, Element, TEST_ID_ATTRIBUTE};
use crate::engine::{BuiltinKind, Engine};
use crate::family::KindFunctions;
use crate::query::{uppercase_first_letter, BoundQuery, QueryRegistry};
use crate::result::{WiringError, WiringResult};
use crate::wait::{self, WaitOptions};
use crate::wiring::Children;

/// Builds custom global actions from the default globals
pub type GlobalFunctionsFn = Arc<dyn Fn(&Globals) -> Actions + Send + Sync>;

/// Builds custom actions for every element scope
pub type WithinElementFunctionsFn = Arc<dyn Fn(&Scope) -> Actions + Send + Sync>;

/// Name of the finder action installed for a child (`counter` → `findCounter`)
#[must_use]
pub fn finder_name(child: &str) -> String {
    format!("find{}", uppercase_first_letter(child))
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Configuration shared by every scope of one render
pub(crate) struct WiringContext {
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) registry: QueryRegistry,
    pub(crate) wait: WaitOptions,
    pub(crate) base_element: Element,
    pub(crate) global_functions: Vec<GlobalFunctionsFn>,
    pub(crate) within_functions: Vec<WithinElementFunctionsFn>,
    pub(crate) roots: Children,
}

impl fmt::Debug for WiringContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringContext")
            .field("engine", &self.engine.name())
            .field("kinds", &self.registry.kinds())
            .field("wait", &self.wait)
            .field("base_element", &self.base_element)
            .field("roots", &self.roots.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WiringContext {
    pub(crate) fn new(engine: Arc<dyn Engine>, base_element: Element) -> Self {
        Self {
            wait: engine.wait_options(),
            engine,
            registry: QueryRegistry::new(),
            base_element,
            global_functions: Vec::new(),
            within_functions: Vec::new(),
            roots: Children::new(),
        }
    }
}

// =============================================================================
// GLOBALS
// =============================================================================

/// Functions available at every level, independent of the current element
#[derive(Debug, Clone)]
pub struct Globals {
    context: Arc<WiringContext>,
}

impl Globals {
    /// Backing engine
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.context.engine
    }

    /// Wait options used by finds and waits
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        self.context.wait
    }

    /// Click an element
    pub fn click_element(&self, element: &Element) -> WiringResult<()> {
        self.context.engine.dispatch(element, DomEvent::Click)
    }

    /// Focus an element
    pub fn focus_element(&self, element: &Element) -> WiringResult<()> {
        self.context.engine.dispatch(element, DomEvent::Focus)
    }

    /// Blur an element
    pub fn blur_element(&self, element: &Element) -> WiringResult<()> {
        self.context.engine.dispatch(element, DomEvent::Blur)
    }

    /// Type text into an element
    pub fn type_into_element(&self, element: &Element, text: &str) -> WiringResult<()> {
        self.context.engine.type_into(element, text)
    }

    /// Retry `attempt` until it succeeds or the wait times out
    pub async fn wait_for<T, F>(&self, attempt: F) -> WiringResult<T>
    where
        F: FnMut() -> WiringResult<T>,
    {
        wait::wait_for(&self.context.wait, attempt).await
    }

    /// Poll `predicate` until it holds; [`WiringError::Timeout`] names
    /// `description` when it never does
    pub async fn wait_until<F>(&self, description: &str, predicate: F) -> WiringResult<()>
    where
        F: FnMut() -> bool,
    {
        wait::wait_until(&self.context.wait, description, predicate).await
    }

    /// Sleep for a fixed time
    pub async fn wait(&self, duration_ms: u64) {
        wait::wait_timeout(duration_ms).await;
    }

    /// Scope at the engine's base element
    #[must_use]
    pub fn within_base_element(&self) -> Scope {
        Scope::ambient(
            Arc::clone(&self.context),
            self.context.base_element.clone(),
        )
    }

    /// Serialize a root element, print it and return it
    pub fn serialize(&self, element: &Element) -> WiringResult<String> {
        let serialized = crate::serialize::serialize_root(&self.context, element)?;
        println!("{serialized}");
        Ok(serialized)
    }
}

// =============================================================================
// SCOPE
// =============================================================================

/// Composed capabilities at one element
#[derive(Clone)]
pub struct Scope {
    element: Element,
    name: Option<String>,
    context: Arc<WiringContext>,
    actions: Arc<Actions>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("element", &self.element)
            .field("name", &self.name)
            .field("actions", &self.actions)
            .finish()
    }
}

impl Scope {
    /// Default functions at `element`: custom globals, then custom
    /// within-element functions
    pub(crate) fn ambient(context: Arc<WiringContext>, element: Element) -> Self {
        let mut scope = Self {
            element,
            name: None,
            context: Arc::clone(&context),
            actions: Arc::new(Actions::new()),
        };
        if !context.global_functions.is_empty() {
            let globals = scope.globals();
            let mut actions = Actions::new();
            for global in &context.global_functions {
                actions.merge(global(&globals));
            }
            scope = scope.with_actions(actions);
        }
        for within in &context.within_functions {
            let actions = within(&scope);
            scope = scope.with_actions(actions);
        }
        scope
    }

    /// New scope with `actions` layered on top
    #[must_use]
    pub fn with_actions(&self, actions: Actions) -> Self {
        if actions.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.actions).clone();
        merged.merge(actions);
        Self {
            actions: Arc::new(merged),
            ..self.clone()
        }
    }

    pub(crate) fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub(crate) fn context(&self) -> &Arc<WiringContext> {
        &self.context
    }

    // -------------------------------------------------------------------------
    // Element
    // -------------------------------------------------------------------------

    /// Element this scope is bound to
    #[must_use]
    pub const fn element(&self) -> &Element {
        &self.element
    }

    /// Same as [`Scope::element`]; the container queries search below
    #[must_use]
    pub const fn container(&self) -> &Element {
        &self.element
    }

    /// Wiring name the element was found under, `None` at the root
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The element if it was found under `name`
    #[must_use]
    pub fn named(&self, name: &str) -> Option<&Element> {
        (self.name.as_deref() == Some(name)).then_some(&self.element)
    }

    /// Backing engine
    #[must_use]
    pub fn engine(&self) -> &Arc<dyn Engine> {
        &self.context.engine
    }

    /// Wait options used by finds
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        self.context.wait
    }

    /// The element's `data-testid`
    #[must_use]
    pub fn test_id(&self) -> Option<String> {
        self.attribute(TEST_ID_ATTRIBUTE)
    }

    /// Read an attribute of the element
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.context.engine.attribute(&self.element, name)
    }

    /// Whether the element carries an attribute
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Text content of the element
    #[must_use]
    pub fn text_content(&self) -> String {
        self.context.engine.text_content(&self.element)
    }

    /// Form value of the element
    #[must_use]
    pub fn value(&self) -> Option<String> {
        self.context.engine.value(&self.element)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Function family of a registered kind, scoped to this element
    pub fn by(&self, kind: &str) -> WiringResult<KindFunctions> {
        self.context
            .registry
            .bind(&self.context.engine, kind, &self.element, self.context.wait)
            .map(KindFunctions::new)
    }

    fn builtin(&self, kind: BuiltinKind) -> KindFunctions {
        KindFunctions::new(BoundQuery::builtin(
            &self.context.engine,
            kind,
            &self.element,
            self.context.wait,
        ))
    }

    /// Text family
    #[must_use]
    pub fn by_text(&self) -> KindFunctions {
        self.builtin(BuiltinKind::Text)
    }

    /// Test id family
    #[must_use]
    pub fn by_test_id(&self) -> KindFunctions {
        self.builtin(BuiltinKind::TestId)
    }

    /// Alt text family
    #[must_use]
    pub fn by_alt_text(&self) -> KindFunctions {
        self.builtin(BuiltinKind::AltText)
    }

    /// Placeholder family
    #[must_use]
    pub fn by_placeholder_text(&self) -> KindFunctions {
        self.builtin(BuiltinKind::PlaceholderText)
    }

    /// Text content of the descendant with the given test id
    pub fn get_text_content(&self, test_id: &str) -> WiringResult<String> {
        let element = self.by_test_id().get(test_id)?;
        Ok(self.context.engine.text_content(&element))
    }

    /// Text contents of several descendants, in order
    pub fn get_text_contents(&self, test_ids: &[&str]) -> WiringResult<Vec<String>> {
        test_ids
            .iter()
            .map(|id| self.get_text_content(id))
            .collect()
    }

    /// Default scope at another element
    #[must_use]
    pub fn within(&self, element: &Element) -> Self {
        Self::ambient(Arc::clone(&self.context), element.clone())
    }

    /// Default scope at the engine's base element
    #[must_use]
    pub fn within_base_element(&self) -> Self {
        self.within(&self.context.base_element)
    }

    // -------------------------------------------------------------------------
    // Element actions
    // -------------------------------------------------------------------------

    /// Global functions
    #[must_use]
    pub fn globals(&self) -> Globals {
        Globals {
            context: Arc::clone(&self.context),
        }
    }

    /// Click the element
    pub fn click(&self) -> WiringResult<()> {
        self.globals().click_element(&self.element)
    }

    /// Focus the element
    pub fn focus(&self) -> WiringResult<()> {
        self.globals().focus_element(&self.element)
    }

    /// Blur the element
    pub fn blur(&self) -> WiringResult<()> {
        self.globals().blur_element(&self.element)
    }

    /// Type text into the element
    pub fn type_into(&self, text: &str) -> WiringResult<()> {
        self.globals().type_into_element(&self.element, text)
    }

    /// Serialize a root element, print it and return it
    pub fn serialize(&self, element: &Element) -> WiringResult<String> {
        self.globals().serialize(element)
    }

    // -------------------------------------------------------------------------
    // Named actions
    // -------------------------------------------------------------------------

    /// Named actions of this scope
    #[must_use]
    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Whether a named action exists
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.actions.contains(name)
    }

    /// Invoke a named action without arguments
    pub async fn call(&self, name: &str) -> WiringResult<Outcome> {
        self.call_with(name, Args::new()).await
    }

    /// Invoke a named action
    pub async fn call_with(&self, name: &str, args: Args) -> WiringResult<Outcome> {
        let action = Arc::clone(self.actions.require(name)?);
        tracing::trace!(function = name, element = %self.element, "call");
        action.call(self.clone(), args).await
    }

    /// Invoke the finder of a single-match child
    pub async fn find_one(&self, child: &str) -> WiringResult<Self> {
        self.find_with(child, Args::new()).await
    }

    /// Invoke the finder of a multiple-match child
    pub async fn find(&self, child: &str, select: Select) -> WiringResult<Self> {
        self.find_with(child, Args::new().with_select(select)).await
    }

    /// Invoke a child finder with explicit arguments
    pub async fn find_with(&self, child: &str, args: Args) -> WiringResult<Self> {
        let name = finder_name(child);
        self.call_with(&name, args)
            .await?
            .into_scope()
            .ok_or(WiringError::UnexpectedOutcome {
                name,
                expected: "scope",
            })
    }
}
