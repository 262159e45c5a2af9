//! Testwire: Declarative Test Wiring for DOM Component Tests
//!
//! A wiring tree names the elements of a rendered UI, how to find them and
//! what each one can do. From it testwire builds nested `find<Name>`
//! accessors that wait for elements and expose composed actions at every
//! level, and a plain-text serializer that replaces brittle full-DOM
//! snapshots with readable ones.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    TESTWIRE Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Wiring     │    │ Finder /   │    │ Engine     │            │
//! │   │ tree       │───►│ Serializer │───►│ (MemoryDom,│            │
//! │   │ (variants) │    │ (Scope)    │    │  Story)    │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use testwire::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> WiringResult<()> {
//! let wiring = Wiring::new().child(
//!     "counter",
//!     WiringNode::new("counter")
//!         .child("count", WiringNode::new("count"))
//!         .extend(|_, _| {
//!             Actions::new().with("increase", |scope, _| async move {
//!                 scope.by_text().click("+")?;
//!                 Ok(())
//!             })
//!         })
//!         .serialize(|_, s| format!("count: {}", s.get_text_content("count").unwrap_or_default())),
//! );
//!
//! let handler = get_render(wiring, WiringConfig::default());
//! let root = handler.render(
//!     ElementSpec::new("div")
//!         .test_id("counter")
//!         .child(ElementSpec::new("span").test_id("count").text("0"))
//!         .child(ElementSpec::new("button").text("+").on_click(|dom, button| {
//!             let count = dom.children(&dom.parent(button).unwrap())[0].clone();
//!             dom.set_text(&count, "1").unwrap();
//!         })),
//! )?;
//!
//! let counter = root.find_one("counter").await?;
//! counter.call("increase").await?;
//! assert_eq!(handler.serialize(counter.element())?, "count: 1");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod action;
pub mod dom;
pub mod element;
pub mod engine;
pub mod family;
mod finder;
pub mod logging;
pub mod query;
pub mod render;
pub mod result;
pub mod scope;
pub mod serialize;
pub mod snapshot;
#[cfg(feature = "story")]
pub mod story;
pub mod variant;
pub mod wait;
pub mod wiring;

pub use action::{Action, ActionRef, Actions, Args, FilterFn, Outcome, Select};
pub use dom::{ElementSpec, Listener, MemoryDom};
pub use element::{normalize_text, DomEvent, Element, FindValue, TEST_ID_ATTRIBUTE};
pub use engine::{BuiltinKind, Engine, Render, Rendered};
pub use family::KindFunctions;
pub use logging::init_test_logging;
pub use query::{
    normalize_kind, uppercase_first_letter, BoundQuery, KindQuery, Multiplicity, QueryAllFn,
    QueryPlan, QueryRegistry, DEFAULT_KIND,
};
pub use render::{get_render, RenderFn, RenderHandler, SnapshotSerializer, WiringConfig};
pub use result::{WiringError, WiringResult};
pub use scope::{finder_name, GlobalFunctionsFn, Globals, Scope, WithinElementFunctionsFn};
pub use serialize::{combine, SerializeScope};
pub use snapshot::{Snapshot, SnapshotConfig, SnapshotDiff, SnapshotStore};
#[cfg(feature = "story")]
pub use story::StoryEngine;
pub use variant::{resolve_node, ResolvedNode, MAX_VARIANT_DEPTH};
pub use wait::{wait_for, wait_timeout, wait_until, WaitOptions};
pub use wiring::{
    Children, ExtendFn, FindSpec, Layer, NodeShape, Polymorphism, SelectorFn, SerializeFn,
    Variant, VariantSerializeFn, Wiring, WiringNode,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::action::{Actions, Args, Outcome, Select};
    pub use super::dom::{ElementSpec, MemoryDom};
    pub use super::element::{DomEvent, Element, FindValue};
    pub use super::engine::{Engine, Render, Rendered};
    pub use super::render::{get_render, RenderHandler, WiringConfig};
    pub use super::result::{WiringError, WiringResult};
    pub use super::scope::{Globals, Scope};
    pub use super::serialize::{combine, SerializeScope};
    pub use super::snapshot::{SnapshotConfig, SnapshotStore};
    #[cfg(feature = "story")]
    pub use super::story::StoryEngine;
    pub use super::wait::WaitOptions;
    pub use super::wiring::{Polymorphism, Variant, Wiring, WiringNode};
}
