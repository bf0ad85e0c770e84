//! Error types for the tree engine
//!
//! Only a document that fails to parse aborts an operation. Pattern errors
//! are reported per pattern and skipped by the soft-fail surface.

use script_query::SelectorError;
use script_tree::{DocumentError, NodeId};

use crate::config::ConfigError;

/// Errors raised by engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Input text is not a valid script document
    #[error("invalid script document: {0}")]
    Document(#[from] DocumentError),

    /// Input text exceeds the configured size limit
    #[error("script document is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    /// Pattern does not compile
    #[error("invalid pattern '{pattern}': {source}")]
    Selector {
        pattern: String,
        #[source]
        source: SelectorError,
    },

    /// Pattern would delete a member every node must carry
    #[error("pattern '{pattern}' targets required field '{field}'")]
    FieldNotRemovable { pattern: String, field: String },

    /// Anchor of a children query is not in the document
    #[error("anchor node not found: {0}")]
    AnchorNotFound(NodeId),

    /// Engine configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Create pattern compile error
    pub fn selector(pattern: impl Into<String>, source: SelectorError) -> Self {
        Self::Selector {
            pattern: pattern.into(),
            source,
        }
    }

    /// Check if the whole operation had to be abandoned
    #[must_use]
    pub fn is_document_failure(&self) -> bool {
        matches!(self, Self::Document(_) | Self::TooLarge { .. })
    }

    /// Check if the error is the anchored not-found condition
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AnchorNotFound(_))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
