//! Per-kind function families.
//!
//! Every registered kind, built-in or custom, gets the same set of
//! interactions on top of its query family: wait for it, click it, wait for
//! it and click it, wait for it to go away.

use crate::element::{DomEvent, Element, FindValue};
use crate::query::BoundQuery;
use crate::result::{WiringError, WiringResult};
use crate::wait::wait_for;

/// Query and interaction family of one kind, bound to a container
#[derive(Debug, Clone)]
pub struct KindFunctions {
    bound: BoundQuery,
}

impl KindFunctions {
    pub(crate) const fn new(bound: BoundQuery) -> Self {
        Self { bound }
    }

    /// Kind name
    #[must_use]
    pub fn kind(&self) -> &str {
        self.bound.kind()
    }

    /// Underlying bound query
    #[must_use]
    pub const fn bound(&self) -> &BoundQuery {
        &self.bound
    }

    /// All matches, possibly none
    pub fn query_all(&self, value: impl Into<FindValue>) -> WiringResult<Vec<Element>> {
        self.bound.query_all(&value.into())
    }

    /// At most one match
    pub fn query(&self, value: impl Into<FindValue>) -> WiringResult<Option<Element>> {
        self.bound.query(&value.into())
    }

    /// Exactly one match
    pub fn get(&self, value: impl Into<FindValue>) -> WiringResult<Element> {
        self.bound.get(&value.into())
    }

    /// At least one match
    pub fn get_all(&self, value: impl Into<FindValue>) -> WiringResult<Vec<Element>> {
        self.bound.get_all(&value.into())
    }

    /// Wait for exactly one match
    pub async fn find(&self, value: impl Into<FindValue>) -> WiringResult<Element> {
        self.bound.find(&value.into()).await
    }

    /// Wait for at least one match
    pub async fn find_all(&self, value: impl Into<FindValue>) -> WiringResult<Vec<Element>> {
        self.bound.find_all(&value.into()).await
    }

    /// Resolve with the element once it is present
    pub async fn wait_for(&self, value: impl Into<FindValue>) -> WiringResult<Element> {
        self.find(value).await
    }

    /// Get the element now and click it
    pub fn click(&self, value: impl Into<FindValue>) -> WiringResult<Element> {
        let element = self.get(value)?;
        self.bound.engine().dispatch(&element, DomEvent::Click)?;
        Ok(element)
    }

    /// Wait for the element, then click it
    pub async fn find_and_click(&self, value: impl Into<FindValue>) -> WiringResult<Element> {
        let element = self.find(value).await?;
        tracing::debug!(kind = self.kind(), element = %element, "find and click");
        self.bound.engine().dispatch(&element, DomEvent::Click)?;
        Ok(element)
    }

    /// Wait until nothing matches any more
    pub async fn eliminate(&self, value: impl Into<FindValue>) -> WiringResult<()> {
        let value = value.into();
        wait_for(self.bound.wait_options(), || {
            if self.bound.query_all(&value)?.is_empty() {
                Ok(())
            } else {
                Err(WiringError::StillPresent {
                    kind: self.kind().to_string(),
                    value: value.to_string(),
                })
            }
        })
        .await
    }
}
