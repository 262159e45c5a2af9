//! Query resolution.
//!
//! Every lookup kind is an explicit registry entry holding one primitive,
//! `query_all(engine, container, value)`. The rest of the query family
//! (`query`, `get`, `get_all`, `find`, `find_all`) is derived from it, so a
//! custom kind behaves exactly like a built-in one.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::element::{Element, FindValue};
use crate::engine::{BuiltinKind, Engine};
use crate::result::{WiringError, WiringResult};
use crate::wait::{wait_for, WaitOptions};

/// Kind used when a node does not name one
pub const DEFAULT_KIND: &str = "TestId";

/// Custom query primitive: all matches of `value` below `container`
pub type QueryAllFn =
    Arc<dyn Fn(&dyn Engine, &Element, &FindValue) -> WiringResult<Vec<Element>> + Send + Sync>;

/// Upper-case the first character (`"iconName"` → `"IconName"`)
#[must_use]
pub fn uppercase_first_letter(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Normalize a kind name as written in a wiring tree
#[must_use]
pub fn normalize_kind(kind: &str) -> String {
    uppercase_first_letter(kind)
}

#[derive(Clone)]
enum QuerySource {
    Builtin(BuiltinKind),
    Custom(QueryAllFn),
}

/// A registered kind and its primitive
#[derive(Clone)]
pub struct KindQuery {
    kind: String,
    source: QuerySource,
}

impl fmt::Debug for KindQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            QuerySource::Builtin(_) => "builtin",
            QuerySource::Custom(_) => "custom",
        };
        f.debug_struct("KindQuery")
            .field("kind", &self.kind)
            .field("source", &source)
            .finish()
    }
}

impl KindQuery {
    /// Normalized kind name
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether this kind is provided natively by the engine
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        matches!(self.source, QuerySource::Builtin(_))
    }

    fn run(
        &self,
        engine: &dyn Engine,
        container: &Element,
        value: &FindValue,
    ) -> WiringResult<Vec<Element>> {
        match &self.source {
            QuerySource::Builtin(kind) => engine.query_all(container, *kind, value),
            QuerySource::Custom(query) => query(engine, container, value),
        }
    }
}

/// Registry of lookup kinds
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    kinds: BTreeMap<String, KindQuery>,
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryRegistry {
    /// Registry with the built-in kinds
    #[must_use]
    pub fn new() -> Self {
        let kinds = BuiltinKind::ALL
            .iter()
            .map(|kind| {
                (
                    kind.name().to_string(),
                    KindQuery {
                        kind: kind.name().to_string(),
                        source: QuerySource::Builtin(*kind),
                    },
                )
            })
            .collect();
        Self { kinds }
    }

    /// Register a custom kind; replaces a previous kind with the same name
    pub fn register(&mut self, kind: &str, query: QueryAllFn) {
        let kind = normalize_kind(kind);
        tracing::debug!(kind = %kind, "registering custom query kind");
        let _ = self.kinds.insert(
            kind.clone(),
            KindQuery {
                kind,
                source: QuerySource::Custom(query),
            },
        );
    }

    /// Look up a kind by (un-normalized) name
    pub fn get(&self, kind: &str) -> WiringResult<&KindQuery> {
        let kind = normalize_kind(kind);
        self.kinds
            .get(&kind)
            .ok_or(WiringError::UnknownQueryKind { kind })
    }

    /// Registered kind names, sorted
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.kinds.keys().map(String::as_str).collect()
    }

    /// Bind a kind to an engine and container
    pub fn bind(
        &self,
        engine: &Arc<dyn Engine>,
        kind: &str,
        container: &Element,
        wait: WaitOptions,
    ) -> WiringResult<BoundQuery> {
        Ok(BoundQuery {
            engine: Arc::clone(engine),
            query: self.get(kind)?.clone(),
            container: container.clone(),
            wait,
        })
    }

    /// Resolve the query a node uses.
    ///
    /// `from_root` switches the container to `base_element`, the base the
    /// fixture was rendered into.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        engine: &Arc<dyn Engine>,
        kind: &str,
        multiplicity: Multiplicity,
        container: &Element,
        base_element: &Element,
        from_root: bool,
        wait: WaitOptions,
    ) -> WiringResult<QueryPlan> {
        let container = if from_root { base_element } else { container };
        Ok(QueryPlan {
            bound: self.bind(engine, kind, container, wait)?,
            multiplicity,
        })
    }
}

/// Whether a node stands for one element or zero-or-more siblings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// Exactly one element
    One,
    /// Zero or more sibling elements
    Many,
}

impl Multiplicity {
    /// From an `is_multiple` flag
    #[must_use]
    pub const fn from_multiple(multiple: bool) -> Self {
        if multiple {
            Self::Many
        } else {
            Self::One
        }
    }
}

/// A kind bound to an engine and a container
#[derive(Clone)]
pub struct BoundQuery {
    engine: Arc<dyn Engine>,
    query: KindQuery,
    container: Element,
    wait: WaitOptions,
}

impl fmt::Debug for BoundQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundQuery")
            .field("kind", &self.query.kind)
            .field("container", &self.container)
            .finish()
    }
}

impl BoundQuery {
    /// Bind a built-in kind without going through a registry
    pub(crate) fn builtin(
        engine: &Arc<dyn Engine>,
        kind: BuiltinKind,
        container: &Element,
        wait: WaitOptions,
    ) -> Self {
        Self {
            engine: Arc::clone(engine),
            query: KindQuery {
                kind: kind.name().to_string(),
                source: QuerySource::Builtin(kind),
            },
            container: container.clone(),
            wait,
        }
    }

    /// Kind name
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.query.kind
    }

    /// Container the query searches below
    #[must_use]
    pub const fn container(&self) -> &Element {
        &self.container
    }

    /// Wait options used by `find`/`find_all`
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    pub(crate) fn engine(&self) -> &Arc<dyn Engine> {
        &self.engine
    }

    pub(crate) fn not_found(&self, value: &FindValue) -> WiringError {
        WiringError::ElementNotFound {
            kind: self.query.kind.clone(),
            value: value.to_string(),
        }
    }

    /// All matches, possibly none
    pub fn query_all(&self, value: &FindValue) -> WiringResult<Vec<Element>> {
        self.query.run(self.engine.as_ref(), &self.container, value)
    }

    /// At most one match; several matches is an error
    pub fn query(&self, value: &FindValue) -> WiringResult<Option<Element>> {
        let mut found = self.query_all(value)?;
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            _ => Err(WiringError::MultipleElementsFound {
                kind: self.query.kind.clone(),
                value: value.to_string(),
            }),
        }
    }

    /// Exactly one match
    pub fn get(&self, value: &FindValue) -> WiringResult<Element> {
        self.query(value)?.ok_or_else(|| self.not_found(value))
    }

    /// At least one match
    pub fn get_all(&self, value: &FindValue) -> WiringResult<Vec<Element>> {
        let found = self.query_all(value)?;
        if found.is_empty() {
            Err(self.not_found(value))
        } else {
            Ok(found)
        }
    }

    /// Wait until exactly one element matches
    pub async fn find(&self, value: &FindValue) -> WiringResult<Element> {
        wait_for(&self.wait, || self.get(value)).await
    }

    /// Wait until at least one element matches
    pub async fn find_all(&self, value: &FindValue) -> WiringResult<Vec<Element>> {
        wait_for(&self.wait, || self.get_all(value)).await
    }
}

/// A bound query plus the multiplicity of the node using it
#[derive(Debug, Clone)]
pub struct QueryPlan {
    bound: BoundQuery,
    multiplicity: Multiplicity,
}

impl QueryPlan {
    /// Underlying bound query
    #[must_use]
    pub const fn bound(&self) -> &BoundQuery {
        &self.bound
    }

    /// Node multiplicity
    #[must_use]
    pub const fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Waiting lookup: one element, or all (at least one) for `Many`
    pub async fn find(&self, value: &FindValue) -> WiringResult<Vec<Element>> {
        match self.multiplicity {
            Multiplicity::One => Ok(vec![self.bound.find(value).await?]),
            Multiplicity::Many => self.bound.find_all(value).await,
        }
    }

    /// Non-waiting lookup: zero or one element, or all for `Many`
    pub fn query(&self, value: &FindValue) -> WiringResult<Vec<Element>> {
        match self.multiplicity {
            Multiplicity::One => Ok(self.bound.query(value)?.into_iter().collect()),
            Multiplicity::Many => self.bound.query_all(value),
        }
    }
}
