//! Document sessions
//!
//! A [`DocumentSession`] owns one parsed document for the length of one
//! operation: open, locate and mutate any number of times, then
//! [`finish`](DocumentSession::finish) into text. Nothing is shared between
//! sessions, so two sessions never observe each other's edits.

use indexmap::{IndexMap, IndexSet};
use script_query::{Predicate, Selector, Target};
use script_tree::{fields, NodeId, NodeType, ScriptDocument, ScriptNode};
use serde_json::Value;

use crate::cache::SelectorCache;
use crate::config::OutputFormat;
use crate::error::{EngineError, Result};

/// Properties to set on one node, applied in map order
pub type PropertyMap = IndexMap<String, Value>;

/// Property merges keyed by node id (or another member, see
/// [`DocumentSession::merge_properties_by`])
pub type NodeProps = IndexMap<String, PropertyMap>;

/// Counters of the edits applied in one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditSummary {
    /// Nodes removed, descendants included
    pub nodes_removed: usize,
    /// Members removed from nodes
    pub fields_removed: usize,
    /// Nodes that received a property merge
    pub nodes_merged: usize,
    /// Patterns skipped because they failed to compile or apply
    pub patterns_skipped: usize,
}

impl EditSummary {
    /// Check if the document was changed
    #[inline]
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.nodes_removed == 0 && self.fields_removed == 0 && self.nodes_merged == 0
    }
}

/// Scoped handle over one parsed document
#[derive(Debug, Clone)]
pub struct DocumentSession {
    document: ScriptDocument,
    selectors: SelectorCache,
    output: OutputFormat,
    excerpt: String,
    summary: EditSummary,
}

impl DocumentSession {
    /// Parse a document into a new session
    ///
    /// # Errors
    /// Returns [`EngineError::Document`] if the text is not a script document
    pub fn open(text: &str) -> Result<Self> {
        Self::open_with(text, SelectorCache::disabled(), OutputFormat::default())
    }

    pub(crate) fn open_with(
        text: &str,
        selectors: SelectorCache,
        output: OutputFormat,
    ) -> Result<Self> {
        let document = ScriptDocument::from_json(text)?;
        Ok(Self {
            document,
            selectors,
            output,
            excerpt: excerpt(text),
            summary: EditSummary::default(),
        })
    }

    /// Wrap an already parsed document
    #[must_use]
    pub fn from_document(document: ScriptDocument) -> Self {
        Self {
            document,
            selectors: SelectorCache::disabled(),
            output: OutputFormat::default(),
            excerpt: String::new(),
            summary: EditSummary::default(),
        }
    }

    /// Current document state
    #[inline]
    #[must_use]
    pub fn document(&self) -> &ScriptDocument {
        &self.document
    }

    /// Edits applied so far
    #[inline]
    #[must_use]
    pub fn summary(&self) -> &EditSummary {
        &self.summary
    }

    /// First node in pre-order with the given id
    #[inline]
    #[must_use]
    pub fn locate(&self, id: &NodeId) -> Option<&ScriptNode> {
        self.document.locate(id)
    }

    /// Delete nodes by id together with their subtrees
    ///
    /// Blank and missing ids are ignored, and a repeated id removes at most
    /// one node. Returns the number of nodes removed.
    pub fn delete_ids<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: IndexSet<NodeId> = ids
            .into_iter()
            .map(|id| NodeId::from(id.as_ref()))
            .filter(|id| !id.is_blank())
            .collect();

        let mut removed = 0;
        for id in ids {
            match self.document.remove(&id) {
                Some(node) => removed += 1 + node.descendant_count(),
                None => tracing::debug!("Delete target not found: {}", id),
            }
        }
        self.summary.nodes_removed += removed;
        removed
    }

    /// Compile a pattern and delete what it selects
    ///
    /// # Errors
    /// - [`EngineError::Selector`] if the pattern does not compile
    /// - [`EngineError::FieldNotRemovable`] if it targets a required member
    pub fn delete_pattern(&mut self, pattern: &str) -> Result<usize> {
        let selector = self
            .selectors
            .get_or_compile(pattern)
            .map_err(|source| EngineError::selector(pattern, source))?;
        self.delete_selected(&selector, pattern)
    }

    /// Apply patterns in order, skipping the ones that fail
    ///
    /// Later patterns see the document as left by earlier ones. Returns the
    /// number of patterns applied.
    pub fn delete_patterns<I, S>(&mut self, patterns: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut applied = 0;
        for pattern in patterns {
            let pattern = pattern.as_ref();
            match self.delete_pattern(pattern) {
                Ok(_) => applied += 1,
                Err(e) => {
                    self.summary.patterns_skipped += 1;
                    tracing::warn!("Skipping pattern '{}' on document {}: {}", pattern, self.excerpt, e);
                }
            }
        }
        applied
    }

    /// Delete what a compiled selector selects
    ///
    /// Node targets remove the node with its subtree; member targets remove
    /// the member from every matching node.
    ///
    /// # Errors
    /// Returns [`EngineError::FieldNotRemovable`] if the selector targets a
    /// required member
    pub fn delete_matching(&mut self, selector: &Selector) -> Result<usize> {
        self.delete_selected(selector, &selector.to_string())
    }

    fn delete_selected(&mut self, selector: &Selector, pattern: &str) -> Result<usize> {
        match selector.target() {
            Target::Node => {
                let mut removed = 0;
                self.document.retain_nodes(|node, depth| {
                    let matched = selector.matches_at(node, depth);
                    if matched {
                        removed += 1 + node.descendant_count();
                    }
                    !matched
                });
                self.summary.nodes_removed += removed;
                Ok(removed)
            }
            Target::Field(name) => {
                if ScriptNode::is_required_field(name) {
                    return Err(EngineError::FieldNotRemovable {
                        pattern: pattern.to_string(),
                        field: name.clone(),
                    });
                }
                let mut removed = 0;
                self.document.for_each_mut(|node, depth| {
                    if selector.matches_at(node, depth) && matches!(node.remove_field(name), Ok(true)) {
                        removed += 1;
                    }
                });
                self.summary.fields_removed += removed;
                Ok(removed)
            }
        }
    }

    /// Merge properties into nodes addressed by id
    ///
    /// Creates `props` where absent and keeps keys not mentioned. Blank and
    /// missing ids are skipped. Returns the number of nodes merged.
    pub fn merge_properties(&mut self, node_map: &NodeProps) -> usize {
        let mut merged = 0;
        for (id, props) in node_map {
            let id = NodeId::from(id.as_str());
            if id.is_blank() {
                continue;
            }
            match self.document.locate_mut(&id) {
                Some(node) => {
                    node.merge_props(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                    merged += 1;
                }
                None => tracing::debug!("Merge target not found: {}", id),
            }
        }
        self.summary.nodes_merged += merged;
        merged
    }

    /// Merge properties into every node whose `field` equals the map key
    ///
    /// Keys other than `xpathMd5` are not unique, so one entry may reach
    /// several nodes. Returns the number of nodes merged.
    pub fn merge_properties_by(&mut self, field: &str, node_map: &NodeProps) -> usize {
        if field.trim().is_empty() {
            return 0;
        }
        if field == fields::XPATH_MD5 {
            return self.merge_properties(node_map);
        }

        let mut merged = 0;
        for (key, props) in node_map {
            if key.trim().is_empty() {
                continue;
            }
            let predicate = Predicate::eq(field, key.as_str());
            self.document.for_each_mut(|node, _| {
                if predicate.holds(node) {
                    node.merge_props(props.iter().map(|(k, v)| (k.clone(), v.clone())));
                    merged += 1;
                }
            });
        }
        self.summary.nodes_merged += merged;
        merged
    }

    /// Children query
    ///
    /// Without an anchor: every node held in some `children` list, at any
    /// depth. With an anchor: the anchor's direct children. Both optionally
    /// filtered by kind, in document order. A blank anchor counts as absent.
    ///
    /// # Errors
    /// Returns [`EngineError::AnchorNotFound`] if the anchor is not in the
    /// document
    pub fn children(
        &self,
        anchor: Option<&NodeId>,
        node_type: Option<&NodeType>,
    ) -> Result<Vec<ScriptNode>> {
        let anchor = anchor.filter(|id| !id.is_blank());

        let (mut selector, nodes) = match anchor {
            None => (Selector::children(), self.document.roots()),
            Some(id) => {
                let node = self
                    .document
                    .locate(id)
                    .ok_or_else(|| EngineError::AnchorNotFound(id.clone()))?;
                (Selector::roots(), node.children.as_slice())
            }
        };
        if let Some(node_type) = node_type {
            selector = selector.filter(Predicate::node_type(node_type));
        }

        Ok(selector
            .select_from(nodes)
            .map(|found| found.node.clone())
            .collect())
    }

    /// Nodes a compiled selector selects, in document order
    #[must_use]
    pub fn select(&self, selector: &Selector) -> Vec<ScriptNode> {
        selector
            .select(&self.document)
            .map(|found| found.node.clone())
            .collect()
    }

    /// Compile a pattern and return what it selects
    ///
    /// # Errors
    /// Returns [`EngineError::Selector`] if the pattern does not compile
    pub fn query(&self, pattern: &str) -> Result<Vec<ScriptNode>> {
        let selector = self
            .selectors
            .get_or_compile(pattern)
            .map_err(|source| EngineError::selector(pattern, source))?;
        Ok(self.select(&selector))
    }

    /// Serialize in the session's output style, ending the session
    ///
    /// # Errors
    /// Returns [`EngineError::Document`] if serialization fails
    pub fn finish(self) -> Result<String> {
        let output = self.output;
        self.finish_with(output)
    }

    /// Serialize in the given style, ending the session
    ///
    /// # Errors
    /// Returns [`EngineError::Document`] if serialization fails
    pub fn finish_with(self, output: OutputFormat) -> Result<String> {
        tracing::debug!(
            "Session finished: {} nodes removed, {} fields removed, {} nodes merged, {} patterns skipped",
            self.summary.nodes_removed,
            self.summary.fields_removed,
            self.summary.nodes_merged,
            self.summary.patterns_skipped
        );
        let text = match output {
            OutputFormat::Compact => self.document.to_json()?,
            OutputFormat::Pretty => self.document.to_json_pretty()?,
        };
        Ok(text)
    }

    /// End the session keeping the parsed document
    #[inline]
    #[must_use]
    pub fn into_document(self) -> ScriptDocument {
        self.document
    }
}

const EXCERPT_CHARS: usize = 64;

/// Leading part of a document for diagnostics, cut at a char boundary
pub(crate) fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => format!("'{}...' ({} bytes)", &text[..end], text.len()),
        None => format!("'{text}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn node(id: &str, node_type: NodeType, children: Vec<ScriptNode>) -> ScriptNode {
        ScriptNode::builder(id.to_uppercase(), node_type, id)
            .children(children)
            .build()
    }

    /// tp -> tg -> [s1, c1 -> [s2]]
    fn session() -> DocumentSession {
        let s1 = ScriptNode::builder("S1", NodeType::Sampler, "s1")
            .prop("k0", "v0")
            .identification("http#/a#GET")
            .build();
        let s2 = ScriptNode::builder("S2", NodeType::Sampler, "s2")
            .identification("http#/a#GET")
            .build();
        DocumentSession::from_document(ScriptDocument::new(vec![node(
            "tp",
            NodeType::TestPlan,
            vec![node(
                "tg",
                NodeType::ThreadGroup,
                vec![s1, node("c1", NodeType::Controller, vec![s2])],
            )],
        )]))
    }

    fn ids(nodes: &[ScriptNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.id().as_str()).collect()
    }

    fn all_ids(session: &DocumentSession) -> Vec<String> {
        session.document().iter().map(|v| v.node.id().to_string()).collect()
    }

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn delete_ids_counts_subtree() {
        let mut session = session();
        assert_eq!(session.delete_ids(["c1", "missing", " "]), 2);
        assert_eq!(all_ids(&session), vec!["tp", "tg", "s1"]);
        assert_eq!(session.summary().nodes_removed, 2);
    }

    #[test]
    fn repeated_id_removes_first_match_only() {
        let mut session = DocumentSession::from_document(ScriptDocument::new(vec![
            node("d", NodeType::Sampler, vec![]),
            node("d", NodeType::Controller, vec![]),
        ]));
        assert_eq!(session.delete_ids(["d", "d"]), 1);
        let remaining = session.document().roots();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].node_type, NodeType::Controller);
    }

    #[test]
    fn delete_pattern_removes_fields() {
        let mut session = session();
        assert_eq!(session.delete_pattern("$..props").unwrap(), 1);
        assert!(session.locate(&NodeId::from("s1")).unwrap().props.is_none());
        assert_eq!(session.summary().fields_removed, 1);
    }

    #[test]
    fn delete_pattern_removes_nodes() {
        let mut session = session();
        assert_eq!(session.delete_pattern("$..[?(@.type=='CONTROLLER')]").unwrap(), 2);
        assert_eq!(all_ids(&session), vec!["tp", "tg", "s1"]);
    }

    #[test]
    fn delete_pattern_rejects_required_field() {
        let mut session = session();
        let err = session.delete_pattern("$..xpathMd5").unwrap_err();
        assert!(matches!(
            err,
            EngineError::FieldNotRemovable { ref field, .. } if field == "xpathMd5"
        ));
        assert_eq!(session.document().node_count(), 5);
    }

    #[test]
    fn delete_patterns_skips_failures() {
        let mut session = session();
        let applied = session.delete_patterns(["$..[?(", "$..identification", "$..children.name"]);
        assert_eq!(applied, 1);
        assert_eq!(session.summary().patterns_skipped, 2);
        assert_eq!(session.summary().fields_removed, 2);
    }

    #[test]
    fn delete_patterns_see_earlier_edits() {
        let mut session = session();
        session.delete_patterns(["$..[?(@.xpathMd5=='c1')]", "$..identification"]);
        assert_eq!(session.summary().nodes_removed, 2);
        assert_eq!(session.summary().fields_removed, 1);
    }

    #[test]
    fn merge_is_additive() {
        let mut session = session();
        let map: NodeProps = [("s1".to_string(), props(&[("k1", json!("v1"))]))].into_iter().collect();
        assert_eq!(session.merge_properties(&map), 1);
        let s1 = session.locate(&NodeId::from("s1")).unwrap();
        assert_eq!(
            serde_json::to_value(s1.props.as_ref().unwrap()).unwrap(),
            json!({"k0": "v0", "k1": "v1"})
        );
    }

    #[test]
    fn merge_with_duplicate_id_reaches_first_match() {
        let mut session = DocumentSession::from_document(ScriptDocument::new(vec![node(
            "d",
            NodeType::Controller,
            vec![node("d", NodeType::Sampler, vec![])],
        )]));
        let map: NodeProps = [("d".to_string(), props(&[("k", json!("v"))]))].into_iter().collect();
        assert_eq!(session.merge_properties(&map), 1);

        let outer = &session.document().roots()[0];
        assert_eq!(outer.prop("k"), Some(&json!("v")));
        assert!(outer.children[0].props.is_none());
    }

    #[test]
    fn merge_skips_missing_and_blank() {
        let mut session = session();
        let map: NodeProps = [
            ("missing".to_string(), props(&[("k", json!(1))])),
            (String::new(), props(&[("k", json!(1))])),
            ("c1".to_string(), props(&[("k", json!(1))])),
        ]
        .into_iter()
        .collect();
        assert_eq!(session.merge_properties(&map), 1);
        assert_eq!(session.locate(&NodeId::from("c1")).unwrap().prop("k"), Some(&json!(1)));
    }

    #[test]
    fn merge_by_identification_reaches_every_match() {
        let mut session = session();
        let map: NodeProps = [("http#/a#GET".to_string(), props(&[("k", json!(true))]))]
            .into_iter()
            .collect();
        assert_eq!(session.merge_properties_by("identification", &map), 2);
        assert_eq!(session.locate(&NodeId::from("s2")).unwrap().prop("k"), Some(&json!(true)));
        assert_eq!(session.summary().nodes_merged, 2);
    }

    #[test]
    fn children_anchored_and_unanchored() {
        let session = session();
        let tg = NodeId::from("tg");
        assert_eq!(ids(&session.children(Some(&tg), None).unwrap()), vec!["s1", "c1"]);
        assert_eq!(
            ids(&session.children(Some(&tg), Some(&NodeType::Sampler)).unwrap()),
            vec!["s1"]
        );
        assert_eq!(
            ids(&session.children(None, Some(&NodeType::Sampler)).unwrap()),
            vec!["s1", "s2"]
        );
        assert_eq!(ids(&session.children(None, None).unwrap()), vec!["tg", "s1", "c1", "s2"]);
    }

    #[test]
    fn children_blank_anchor_is_unanchored() {
        let session = session();
        let blank = NodeId::from("");
        assert_eq!(
            ids(&session.children(Some(&blank), Some(&NodeType::Controller)).unwrap()),
            vec!["c1"]
        );
    }

    #[test]
    fn children_missing_anchor_is_not_found() {
        let session = session();
        let err = session.children(Some(&NodeId::from("nope")), None).unwrap_err();
        assert!(err.is_not_found());
        let leaf = session.children(Some(&NodeId::from("s2")), None).unwrap();
        assert!(leaf.is_empty());
    }

    #[test]
    fn query_returns_document_order() {
        let session = session();
        assert_eq!(ids(&session.query("$..identification").unwrap()), vec!["s1", "s2"]);
        assert!(session.query("$..[").is_err());
    }

    #[test]
    fn finish_styles() {
        let compact = session().finish().unwrap();
        assert!(!compact.contains('\n'));
        let pretty = session().finish_with(OutputFormat::Pretty).unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(
            ScriptDocument::from_json(&compact).unwrap(),
            ScriptDocument::from_json(&pretty).unwrap()
        );
    }

    #[test]
    fn excerpt_cuts_at_char_boundary() {
        let text = "é".repeat(100);
        let cut = excerpt(&text);
        assert!(cut.starts_with(&format!("'{}...'", "é".repeat(64))));
        assert_eq!(excerpt("[]"), "'[]'");
    }
}
