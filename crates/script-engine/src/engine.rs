//! Tree engine
//!
//! Text-in, text-out operations over script documents. Every call parses its
//! own document, applies its edits through a [`DocumentSession`] and
//! serializes the result; nothing but compiled selectors outlives a call.
//!
//! Each operation comes in two forms: a `try_*` method returning
//! [`Result`], and a soft-fail method that logs the problem and returns
//! `None` so a batch caller can carry on with its next document.

use std::sync::Arc;

use once_cell::sync::Lazy;
use script_query::Selector;
use script_tree::{NodeId, NodeType, ScriptNode};

use crate::cache::SelectorCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::session::{excerpt, DocumentSession, NodeProps};

static GLOBAL: Lazy<TreeEngine> = Lazy::new(TreeEngine::new);

/// Path-addressed editing engine
///
/// Cheap to clone; clones share the selector cache.
#[derive(Debug, Clone)]
pub struct TreeEngine {
    config: EngineConfig,
    selectors: SelectorCache,
    default_patterns: Vec<String>,
}

impl TreeEngine {
    /// Create engine with default configuration
    #[must_use]
    pub fn new() -> Self {
        let config = EngineConfig::default();
        Self {
            selectors: SelectorCache::new(config.selector_cache_capacity),
            default_patterns: config.default_patterns(),
            config,
        }
    }

    /// Create engine from configuration
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] if the configuration does not validate
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selectors: SelectorCache::new(config.selector_cache_capacity),
            default_patterns: config.default_patterns(),
            config,
        })
    }

    /// Process-wide engine with default configuration
    #[inline]
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compiled selector cache
    #[inline]
    #[must_use]
    pub fn selectors(&self) -> &SelectorCache {
        &self.selectors
    }

    /// Sanitization patterns in application order
    #[inline]
    #[must_use]
    pub fn default_patterns(&self) -> &[String] {
        &self.default_patterns
    }

    /// Compile a pattern through the cache
    ///
    /// # Errors
    /// Returns [`EngineError::Selector`] if the pattern does not compile
    pub fn compile(&self, pattern: &str) -> Result<Arc<Selector>> {
        self.selectors
            .get_or_compile(pattern)
            .map_err(|source| EngineError::selector(pattern, source))
    }

    /// Parse a document into a session bound to this engine
    ///
    /// # Errors
    /// - [`EngineError::TooLarge`] if the text exceeds `max_document_bytes`
    /// - [`EngineError::Document`] if the text is not a script document
    pub fn open(&self, text: &str) -> Result<DocumentSession> {
        let limit = self.config.max_document_bytes;
        if text.len() > limit {
            return Err(EngineError::TooLarge {
                size: text.len(),
                limit,
            });
        }
        DocumentSession::open_with(text, self.selectors.clone(), self.config.output)
    }

    // Deletion

    /// Delete nodes by id with their subtrees
    ///
    /// # Errors
    /// Fails only if the document does not parse
    pub fn try_delete_by_ids<I, S>(&self, text: &str, ids: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut session = self.open(text)?;
        session.delete_ids(ids);
        session.finish()
    }

    /// Delete nodes by id; `None` if the document does not parse
    pub fn delete_by_ids<I, S>(&self, text: &str, ids: I) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        soft(text, "delete by ids", self.try_delete_by_ids(text, ids))
    }

    /// Delete what each pattern selects, in order
    ///
    /// With `include_defaults` the sanitization patterns run after the
    /// caller's. Patterns that fail are logged and skipped.
    ///
    /// # Errors
    /// Fails only if the document does not parse
    pub fn try_delete_by_patterns<I, S>(
        &self,
        text: &str,
        patterns: I,
        include_defaults: bool,
    ) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut session = self.open(text)?;
        session.delete_patterns(patterns);
        if include_defaults {
            session.delete_patterns(&self.default_patterns);
        }
        session.finish()
    }

    /// Delete by patterns; `None` if the document does not parse
    pub fn delete_by_patterns<I, S>(
        &self,
        text: &str,
        patterns: I,
        include_defaults: bool,
    ) -> Option<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        soft(
            text,
            "delete by patterns",
            self.try_delete_by_patterns(text, patterns, include_defaults),
        )
    }

    /// Apply only the sanitization patterns; `None` if the document does not parse
    pub fn sanitize(&self, text: &str) -> Option<String> {
        self.delete_by_patterns(text, std::iter::empty::<&str>(), true)
    }

    // Merging

    /// Merge properties into nodes addressed by id
    ///
    /// # Errors
    /// Fails only if the document does not parse
    pub fn try_merge_properties(&self, text: &str, node_map: &NodeProps) -> Result<String> {
        let mut session = self.open(text)?;
        session.merge_properties(node_map);
        session.finish()
    }

    /// Merge properties by id; `None` if the document does not parse
    pub fn merge_properties(&self, text: &str, node_map: &NodeProps) -> Option<String> {
        soft(text, "merge properties", self.try_merge_properties(text, node_map))
    }

    /// Merge properties into every node whose `field` equals the map key
    ///
    /// # Errors
    /// Fails only if the document does not parse
    pub fn try_merge_properties_by(
        &self,
        text: &str,
        field: &str,
        node_map: &NodeProps,
    ) -> Result<String> {
        let mut session = self.open(text)?;
        session.merge_properties_by(field, node_map);
        session.finish()
    }

    /// Merge properties by member; `None` if the document does not parse
    pub fn merge_properties_by(
        &self,
        text: &str,
        field: &str,
        node_map: &NodeProps,
    ) -> Option<String> {
        soft(
            text,
            "merge properties",
            self.try_merge_properties_by(text, field, node_map),
        )
    }

    // Queries

    /// Children query; see [`DocumentSession::children`]
    ///
    /// # Errors
    /// - [`EngineError::Document`] / [`EngineError::TooLarge`] for unusable input
    /// - [`EngineError::AnchorNotFound`] if the anchor is not in the document
    pub fn children(
        &self,
        text: &str,
        anchor: Option<&str>,
        node_type: Option<&NodeType>,
    ) -> Result<Vec<ScriptNode>> {
        let anchor = anchor.map(NodeId::from);
        let result = self
            .open(text)
            .and_then(|session| session.children(anchor.as_ref(), node_type));
        if let Err(e) = &result {
            if e.is_document_failure() {
                tracing::error!("Children query failed on document {}: {}", excerpt(text), e);
            }
        }
        result
    }

    /// Controller children of the anchor (or of the whole document)
    ///
    /// # Errors
    /// See [`TreeEngine::children`]
    pub fn controller_children(&self, text: &str, anchor: Option<&str>) -> Result<Vec<ScriptNode>> {
        self.children(text, anchor, Some(&NodeType::Controller))
    }

    /// Sampler children of the anchor (or of the whole document)
    ///
    /// # Errors
    /// See [`TreeEngine::children`]
    pub fn sampler_children(&self, text: &str, anchor: Option<&str>) -> Result<Vec<ScriptNode>> {
        self.children(text, anchor, Some(&NodeType::Sampler))
    }

    /// Node with the given id, if the document parses and holds it
    pub fn locate(&self, text: &str, id: &str) -> Option<ScriptNode> {
        let id = NodeId::from(id);
        if id.is_blank() {
            return None;
        }
        let session = soft(text, "locate", self.open(text))?;
        session.locate(&id).cloned()
    }

    /// Nodes a pattern selects, in document order
    ///
    /// # Errors
    /// - [`EngineError::Document`] / [`EngineError::TooLarge`] for unusable input
    /// - [`EngineError::Selector`] if the pattern does not compile
    pub fn query(&self, text: &str, pattern: &str) -> Result<Vec<ScriptNode>> {
        let selector = self.compile(pattern)?;
        let session = self.open(text)?;
        Ok(session.select(&selector))
    }

    /// Compare two documents with the sanitization patterns applied to both
    ///
    /// # Errors
    /// Fails if either document does not parse
    pub fn structurally_equal(&self, left: &str, right: &str) -> Result<bool> {
        let sanitized = |text: &str| -> Result<_> {
            let mut session = self.open(text)?;
            session.delete_patterns(&self.default_patterns);
            Ok(session.into_document())
        };
        Ok(sanitized(left)? == sanitized(right)?)
    }
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Log a failed operation and drop the error
fn soft<T>(text: &str, operation: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("Failed to {} on document {}: {}", operation, excerpt(text), e);
            None
        }
    }
}
