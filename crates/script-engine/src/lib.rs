//! Script Tree Engine
//!
//! Targeted structural edits on load-test script documents: delete subtrees
//! by id or by pattern, merge properties into addressed nodes, and extract
//! typed children, all without rebuilding the document elsewhere.
//!
//! # Architecture
//!
//! ```text
//! text ──► TreeEngine::open ──► DocumentSession ──► finish ──► text
//!              │                     │
//!              └── SelectorCache ────┘  (compiled patterns, shared)
//! ```
//!
//! The free functions below run on a process-wide [`TreeEngine`] with the
//! default configuration. Edits return `None` when the input does not parse
//! and log the reason through `tracing`.
//!
//! # Example
//!
//! ```
//! let text = r#"[{"name":"TestPlan","testName":"plan","md5":"m","type":"TEST_PLAN",
//!     "xpath":"/tp","xpathMd5":"tp","props":{"k":"v"},"children":[]}]"#;
//!
//! let cleaned = script_engine::delete_by_patterns(text, ["$..props"], false).unwrap();
//! assert!(!cleaned.contains("props"));
//! assert_eq!(script_engine::delete_by_ids("", ["tp"]), None);
//! ```

#![warn(unreachable_pub)]

mod cache;
mod config;
mod engine;
mod error;
mod session;

pub use cache::SelectorCache;
pub use config::{
    ConfigError, EngineConfig, OutputFormat, DEFAULT_CACHE_CAPACITY, DEFAULT_MAX_DOCUMENT_BYTES,
    DEFAULT_PATTERNS,
};
pub use engine::TreeEngine;
pub use error::{EngineError, Result};
pub use session::{DocumentSession, EditSummary, NodeProps, PropertyMap};

pub use script_query::{Predicate, Selector, SelectorError};
pub use script_tree::{NodeId, NodeType, ScriptDocument, ScriptNode};

/// Delete nodes by id with their subtrees; `None` if the document does not parse
pub fn delete_by_ids<I, S>(text: &str, ids: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TreeEngine::global().delete_by_ids(text, ids)
}

/// Delete what each pattern selects, optionally followed by the default
/// patterns; `None` if the document does not parse
pub fn delete_by_patterns<I, S>(text: &str, patterns: I, include_defaults: bool) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    TreeEngine::global().delete_by_patterns(text, patterns, include_defaults)
}

/// Strip every node's `props`; `None` if the document does not parse
pub fn sanitize(text: &str) -> Option<String> {
    TreeEngine::global().sanitize(text)
}

/// Merge properties into nodes addressed by id
pub fn merge_properties(text: &str, node_map: &NodeProps) -> Option<String> {
    TreeEngine::global().merge_properties(text, node_map)
}

/// Merge properties into every node whose `field` equals the map key
pub fn merge_properties_by(text: &str, field: &str, node_map: &NodeProps) -> Option<String> {
    TreeEngine::global().merge_properties_by(text, field, node_map)
}

/// Children of the anchor, or every non-root node without one
///
/// # Errors
/// See [`TreeEngine::children`]
pub fn children(
    text: &str,
    anchor: Option<&str>,
    node_type: Option<&NodeType>,
) -> Result<Vec<ScriptNode>> {
    TreeEngine::global().children(text, anchor, node_type)
}

/// Controller children
///
/// # Errors
/// See [`TreeEngine::children`]
pub fn controller_children(text: &str, anchor: Option<&str>) -> Result<Vec<ScriptNode>> {
    TreeEngine::global().controller_children(text, anchor)
}

/// Sampler children
///
/// # Errors
/// See [`TreeEngine::children`]
pub fn sampler_children(text: &str, anchor: Option<&str>) -> Result<Vec<ScriptNode>> {
    TreeEngine::global().sampler_children(text, anchor)
}

/// Node with the given id
pub fn locate(text: &str, id: &str) -> Option<ScriptNode> {
    TreeEngine::global().locate(text, id)
}

/// Nodes a pattern selects, in document order
///
/// # Errors
/// See [`TreeEngine::query`]
pub fn query(text: &str, pattern: &str) -> Result<Vec<ScriptNode>> {
    TreeEngine::global().query(text, pattern)
}
