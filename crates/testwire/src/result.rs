//! Result and error types for testwire.
//!
//! The message text of the lookup errors is part of the contract: tests
//! assert on it, so it must not drift.

use thiserror::Error;

/// Result type for testwire operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors that can occur while wiring, finding or serializing
#[derive(Debug, Error)]
pub enum WiringError {
    /// A multiple-match finder was called without an index or filter
    #[error("You tried to call {finder} which was set as isMultiple, without providing either an index, or a filter function")]
    MissingSelector {
        /// Finder name (e.g. `findCounter`)
        finder: String,
    },

    /// A multiple-match finder was called with an index past the last match
    #[error("You tried to find index {index} in {finder} but {highest} is the highest index")]
    IndexOutOfRange {
        /// Finder name
        finder: String,
        /// Requested index
        index: usize,
        /// Highest valid index
        highest: usize,
    },

    /// A filter matched none of the found elements
    #[error("the filter function passed into {finder} didn't find anything")]
    FilterMatchedNothing {
        /// Finder name
        finder: String,
    },

    /// A filter matched more than one of the found elements
    #[error("the filter function passed into {finder} returned {count} elements, it should only return one")]
    FilterMatchedMany {
        /// Finder name
        finder: String,
        /// Number of matching elements
        count: usize,
    },

    /// No element matched a query
    #[error("Unable to find an element with {kind} of {value}")]
    ElementNotFound {
        /// Query kind
        kind: String,
        /// Lookup value
        value: String,
    },

    /// A single-element query matched several elements
    #[error("Found multiple elements with {kind} of {value}")]
    MultipleElementsFound {
        /// Query kind
        kind: String,
        /// Lookup value
        value: String,
    },

    /// An element never disappeared
    #[error("{kind} {value} is still found in the dom it was supposed to be removed")]
    StillPresent {
        /// Query kind
        kind: String,
        /// Lookup value
        value: String,
    },

    /// A wait condition never became true
    #[error("Operation timed out after {ms}ms: {description}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        description: String,
    },

    /// Element is not one of the registered root nodes
    #[error("Element can't be serialized, make sure it's defined in wiring")]
    NotSerializable,

    /// The engine does not support serialization
    #[error("Engine {engine} does not support serialization")]
    SerializationUnsupported {
        /// Engine name
        engine: String,
    },

    /// No query is registered for a kind
    #[error("No query registered for kind {kind}")]
    UnknownQueryKind {
        /// Normalized kind name
        kind: String,
    },

    /// A variant selector returned a key with no variant
    #[error("Variant {variant} is not declared on this node")]
    UnknownVariant {
        /// Variant key returned by the selector
        variant: String,
    },

    /// Variant chain is deeper than the allowed maximum
    #[error("Variant chain exceeded {max} layers, variants must not cycle")]
    VariantDepthExceeded {
        /// Maximum depth
        max: usize,
    },

    /// A named action does not exist in the scope
    #[error("No function named {name} in this scope")]
    UnknownFunction {
        /// Function name
        name: String,
    },

    /// An action returned a different outcome than the caller expected
    #[error("Expected {expected} from {name}")]
    UnexpectedOutcome {
        /// Function name
        name: String,
        /// Expected outcome kind
        expected: &'static str,
    },

    /// No render primitive available
    #[error("No render primitive configured")]
    NoRenderer,

    /// Engine-level failure (detached element, invalid target)
    #[error("Engine error: {message}")]
    Engine {
        /// Error message
        message: String,
    },

    /// Text snapshot differs from the stored one
    #[error("Snapshot mismatch: {name}\n{diff}")]
    SnapshotMismatch {
        /// Snapshot name
        name: String,
        /// Line diff
        diff: String,
    },

    /// Invalid find pattern
    #[error("Invalid find pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WiringError {
    /// Create an engine error
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Whether this error means "the element is not there (yet)"
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. })
    }
}
