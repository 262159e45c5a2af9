//! Named actions.
//!
//! Custom functions (global, within-element, extend layers) and the child
//! finders all live in one [`Actions`] map keyed by name. An action is
//! always invoked with the final composed [`Scope`] of the node it was
//! installed on.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::element::Element;
use crate::result::{WiringError, WiringResult};
use crate::scope::Scope;

// =============================================================================
// ACTION TRAIT
// =============================================================================

/// An invocable, named capability of a scope
#[async_trait]
pub trait Action: Send + Sync {
    /// Run the action against the scope it was looked up on
    async fn call(&self, scope: Scope, args: Args) -> WiringResult<Outcome>;
}

/// Shared action handle
pub type ActionRef = Arc<dyn Action>;

type BoxedFn = dyn Fn(Scope, Args) -> BoxFuture<'static, WiringResult<Outcome>> + Send + Sync;

struct FnAction(Box<BoxedFn>);

#[async_trait]
impl Action for FnAction {
    async fn call(&self, scope: Scope, args: Args) -> WiringResult<Outcome> {
        (self.0)(scope, args).await
    }
}

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Filter over found elements: `(element, data-testid)`
pub type FilterFn = Arc<dyn Fn(&Element, Option<&str>) -> bool + Send + Sync>;

/// Picks one element out of a multiple-match node
#[derive(Clone)]
pub enum Select {
    /// Position among the found elements
    Index(usize),
    /// Predicate that must match exactly one found element
    Filter(FilterFn),
}

impl Select {
    /// Select by index
    #[must_use]
    pub const fn index(index: usize) -> Self {
        Self::Index(index)
    }

    /// Select with a filter
    #[must_use]
    pub fn filter<F>(filter: F) -> Self
    where
        F: Fn(&Element, Option<&str>) -> bool + Send + Sync + 'static,
    {
        Self::Filter(Arc::new(filter))
    }

    /// Select the element whose `data-testid` equals `test_id`
    #[must_use]
    pub fn test_id(test_id: impl Into<String>) -> Self {
        let test_id = test_id.into();
        Self::filter(move |_, id| id == Some(test_id.as_str()))
    }
}

impl fmt::Debug for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => f.debug_tuple("Index").field(index).finish(),
            Self::Filter(_) => f.write_str("Filter(..)"),
        }
    }
}

/// Arguments passed to an action
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Positional values
    pub values: Vec<Value>,
    /// Index or filter for finders of multiple-match nodes
    pub select: Option<Select>,
}

impl Args {
    /// No arguments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finder arguments selecting by index
    #[must_use]
    pub fn index(index: usize) -> Self {
        Self::new().with_select(Select::Index(index))
    }

    /// Finder arguments selecting with a filter
    #[must_use]
    pub fn filter<F>(filter: F) -> Self
    where
        F: Fn(&Element, Option<&str>) -> bool + Send + Sync + 'static,
    {
        Self::new().with_select(Select::filter(filter))
    }

    /// Append a positional value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Set the selection
    #[must_use]
    pub fn with_select(mut self, select: Select) -> Self {
        self.select = Some(select);
        self
    }

    /// Positional value
    #[must_use]
    pub fn value(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Positional value as a string
    #[must_use]
    pub fn str(&self, position: usize) -> Option<&str> {
        self.value(position).and_then(Value::as_str)
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// What an action produced
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Nothing
    Unit,
    /// Plain data
    Value(Value),
    /// An element
    Element(Element),
    /// A nested scope (what child finders return)
    Scope(Box<Scope>),
}

impl Outcome {
    /// Nested scope, if this is one
    #[must_use]
    pub fn into_scope(self) -> Option<Scope> {
        match self {
            Self::Scope(scope) => Some(*scope),
            _ => None,
        }
    }

    /// Element, if this is one
    #[must_use]
    pub fn into_element(self) -> Option<Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Plain data, if this is some
    #[must_use]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Decode plain data into `T`; units and handles decode from `null`
    pub fn deserialize<T: DeserializeOwned>(self) -> WiringResult<T> {
        Ok(serde_json::from_value(self.into_value().unwrap_or(Value::Null))?)
    }

    /// String data, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Value(value) => value.as_str(),
            _ => None,
        }
    }

    /// Boolean data, if this is a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Value(value) => value.as_bool(),
            _ => None,
        }
    }

    /// Whether the action produced nothing
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Unit
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for Outcome {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<&str> for Outcome {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

impl From<Element> for Outcome {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<Scope> for Outcome {
    fn from(scope: Scope) -> Self {
        Self::Scope(Box::new(scope))
    }
}

// =============================================================================
// ACTIONS MAP
// =============================================================================

/// Name → action map
#[derive(Clone, Default)]
pub struct Actions {
    entries: BTreeMap<String, ActionRef>,
}

impl fmt::Debug for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl Actions {
    /// Empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an async action
    #[must_use]
    pub fn with<F, Fut, R>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Scope, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WiringResult<R>> + Send + 'static,
        R: Into<Outcome>,
    {
        self.insert_fn(name, action);
        self
    }

    /// Add a synchronous action
    #[must_use]
    pub fn with_sync<F, R>(self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Scope, &Args) -> WiringResult<R> + Send + Sync + 'static,
        R: Into<Outcome>,
    {
        self.with(name, move |scope, args| {
            let result = action(&scope, &args).map(Into::into);
            async move { result }
        })
    }

    /// Add an [`Action`] implementation
    #[must_use]
    pub fn with_action(mut self, name: impl Into<String>, action: impl Action + 'static) -> Self {
        self.insert(name, Arc::new(action));
        self
    }

    /// Insert an action, replacing any action with the same name
    pub fn insert(&mut self, name: impl Into<String>, action: ActionRef) {
        let _ = self.entries.insert(name.into(), action);
    }

    fn insert_fn<F, Fut, R>(&mut self, name: impl Into<String>, action: F)
    where
        F: Fn(Scope, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = WiringResult<R>> + Send + 'static,
        R: Into<Outcome>,
    {
        let boxed: Box<BoxedFn> = Box::new(move |scope, args| {
            let fut = action(scope, args);
            Box::pin(async move { fut.await.map(Into::into) })
        });
        self.insert(name, Arc::new(FnAction(boxed)));
    }

    /// Merge `other` into `self`; `other` wins on name collisions
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    /// Look up an action
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ActionRef> {
        self.entries.get(name)
    }

    /// Look up an action, failing with [`WiringError::UnknownFunction`]
    pub fn require(&self, name: &str) -> WiringResult<&ActionRef> {
        self.get(name).ok_or_else(|| WiringError::UnknownFunction {
            name: name.to_string(),
        })
    }

    /// Whether an action exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Action names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of actions
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
