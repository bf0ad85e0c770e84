//! Script documents
//!
//! A [`ScriptDocument`] is the ordered sequence of root nodes produced by the
//! converter. It is parsed at the start of an edit, mutated in place and
//! serialized back at the end.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::id::NodeId;
use crate::node::ScriptNode;

/// Ordered forest of script nodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptDocument {
    roots: Vec<ScriptNode>,
}

/// Node reached during a pre-order walk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit<'a> {
    /// The node
    pub node: &'a ScriptNode,
    /// Distance from the root sequence (roots are 0)
    pub depth: usize,
}

impl ScriptDocument {
    /// Create document from root nodes
    #[inline]
    #[must_use]
    pub fn new(roots: Vec<ScriptNode>) -> Self {
        Self { roots }
    }

    /// Parse converter output
    ///
    /// # Errors
    /// - [`DocumentError::Empty`] for blank text
    /// - [`DocumentError::InvalidJson`] if the text is not JSON
    /// - [`DocumentError::NotAnArray`] if the top level is not an array
    /// - [`DocumentError::MalformedNode`] if any root does not match the node shape
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }

        let value: Value = serde_json::from_str(text).map_err(DocumentError::InvalidJson)?;
        let Value::Array(items) = value else {
            return Err(DocumentError::NotAnArray {
                found: json_kind(&value),
            });
        };

        let roots = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(item)
                    .map_err(|source| DocumentError::MalformedNode { index, source })
            })
            .collect::<Result<Vec<ScriptNode>, _>>()?;

        Ok(Self { roots })
    }

    /// Serialize to compact JSON
    ///
    /// # Errors
    /// Returns error if serialization fails (not expected for valid nodes)
    #[inline]
    pub fn to_json(&self) -> Result<String, DocumentError> {
        serde_json::to_string(&self.roots).map_err(DocumentError::Serialize)
    }

    /// Serialize to indented JSON
    ///
    /// # Errors
    /// Returns error if serialization fails (not expected for valid nodes)
    #[inline]
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(&self.roots).map_err(DocumentError::Serialize)
    }

    /// Root nodes
    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[ScriptNode] {
        &self.roots
    }

    /// Mutable root sequence
    #[inline]
    pub fn roots_mut(&mut self) -> &mut Vec<ScriptNode> {
        &mut self.roots
    }

    /// Consume into root nodes
    #[inline]
    #[must_use]
    pub fn into_roots(self) -> Vec<ScriptNode> {
        self.roots
    }

    /// Number of roots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if document has no roots
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes at any depth
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.roots
            .iter()
            .map(|root| 1 + root.descendant_count())
            .sum()
    }

    /// Depth-first pre-order walk, children in stored order
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Preorder<'_> {
        Preorder::over(&self.roots)
    }

    /// First node in pre-order with the given id
    #[must_use]
    pub fn locate(&self, id: &NodeId) -> Option<&ScriptNode> {
        self.iter().map(|visit| visit.node).find(|node| node.id() == id)
    }

    /// Mutable access to the first node with the given id
    pub fn locate_mut(&mut self, id: &NodeId) -> Option<&mut ScriptNode> {
        find_mut(&mut self.roots, id)
    }

    /// Remove the first node with the given id together with its subtree
    pub fn remove(&mut self, id: &NodeId) -> Option<ScriptNode> {
        remove_first(&mut self.roots, id)
    }

    /// Remove every node the predicate rejects
    ///
    /// Walks in pre-order; the subtree of a removed node is not visited.
    /// Returns the number of removed subtrees.
    pub fn retain_nodes<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&ScriptNode, usize) -> bool,
    {
        retain_in(&mut self.roots, 0, &mut keep)
    }

    /// Visit every node mutably in pre-order
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut ScriptNode, usize),
    {
        visit_mut(&mut self.roots, 0, &mut f);
    }
}

impl From<Vec<ScriptNode>> for ScriptDocument {
    fn from(roots: Vec<ScriptNode>) -> Self {
        Self::new(roots)
    }
}

impl<'a> IntoIterator for &'a ScriptDocument {
    type Item = Visit<'a>;
    type IntoIter = Preorder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order iterator over a document
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> Preorder<'a> {
    /// Walk a node sequence as if it were the root sequence
    #[must_use]
    pub fn over(roots: &'a [ScriptNode]) -> Self {
        let stack = roots
            .iter()
            .rev()
            .map(|node| Visit { node, depth: 0 })
            .collect();
        Self { stack }
    }
}

impl<'a> Iterator for Preorder<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;
        let depth = visit.depth + 1;
        self.stack.extend(
            visit
                .node
                .children
                .iter()
                .rev()
                .map(|node| Visit { node, depth }),
        );
        Some(visit)
    }
}

fn find_mut<'a>(nodes: &'a mut [ScriptNode], id: &NodeId) -> Option<&'a mut ScriptNode> {
    for node in nodes {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn remove_first(nodes: &mut Vec<ScriptNode>, id: &NodeId) -> Option<ScriptNode> {
    let mut index = 0;
    while index < nodes.len() {
        if nodes[index].id() == id {
            return Some(nodes.remove(index));
        }
        if let Some(removed) = remove_first(&mut nodes[index].children, id) {
            return Some(removed);
        }
        index += 1;
    }
    None
}

fn retain_in<F>(nodes: &mut Vec<ScriptNode>, depth: usize, keep: &mut F) -> usize
where
    F: FnMut(&ScriptNode, usize) -> bool,
{
    let mut removed = 0;
    nodes.retain_mut(|node| {
        if keep(&*node, depth) {
            removed += retain_in(&mut node.children, depth + 1, &mut *keep);
            true
        } else {
            removed += 1;
            false
        }
    });
    removed
}

fn visit_mut<F>(nodes: &mut [ScriptNode], depth: usize, f: &mut F)
where
    F: FnMut(&mut ScriptNode, usize),
{
    for node in nodes {
        f(&mut *node, depth);
        visit_mut(&mut node.children, depth + 1, f);
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;
    use pretty_assertions::assert_eq;

    fn node(id: &str, node_type: NodeType, children: Vec<ScriptNode>) -> ScriptNode {
        ScriptNode::builder(id.to_uppercase(), node_type, id)
            .children(children)
            .build()
    }

    fn sample() -> ScriptDocument {
        ScriptDocument::new(vec![node(
            "tp",
            NodeType::TestPlan,
            vec![node(
                "tg",
                NodeType::ThreadGroup,
                vec![
                    node("s1", NodeType::Sampler, vec![]),
                    node("c1", NodeType::Controller, vec![node("s2", NodeType::Sampler, vec![])]),
                ],
            )],
        )])
    }

    fn ids(doc: &ScriptDocument) -> Vec<String> {
        doc.iter().map(|v| v.node.id().to_string()).collect()
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(matches!(ScriptDocument::from_json("  \n"), Err(DocumentError::Empty)));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        assert!(matches!(
            ScriptDocument::from_json("[{"),
            Err(DocumentError::InvalidJson(_))
        ));
    }

    #[test]
    fn parse_rejects_non_array() {
        let result = ScriptDocument::from_json(r#"{"name": "TestPlan"}"#);
        assert!(matches!(result, Err(DocumentError::NotAnArray { found: "object" })));
    }

    #[test]
    fn parse_rejects_malformed_node() {
        let text = r#"[
            {"name":"a","testName":"a","md5":"","type":"TEST_PLAN","xpath":"","xpathMd5":"a","children":[]},
            {"name":"b","testName":"b","md5":"","type":"TEST_PLAN","xpath":"","xpathMd5":"b"}
        ]"#;
        let result = ScriptDocument::from_json(text);
        assert!(matches!(result, Err(DocumentError::MalformedNode { index: 1, .. })));
    }

    #[test]
    fn parse_rejects_non_object_element() {
        let result = ScriptDocument::from_json("[1, 2]");
        assert!(matches!(result, Err(DocumentError::MalformedNode { index: 0, .. })));
    }

    #[test]
    fn parse_accepts_empty_array() {
        let doc = ScriptDocument::from_json("[]").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.to_json().unwrap(), "[]");
    }

    #[test]
    fn json_round_trip() {
        let doc = sample();
        let text = doc.to_json().unwrap();
        assert_eq!(ScriptDocument::from_json(&text).unwrap(), doc);
        let pretty = doc.to_json_pretty().unwrap();
        assert_eq!(ScriptDocument::from_json(&pretty).unwrap(), doc);
    }

    #[test]
    fn preorder_visits_document_order() {
        let doc = sample();
        assert_eq!(ids(&doc), vec!["tp", "tg", "s1", "c1", "s2"]);
        let depths: Vec<_> = doc.iter().map(|v| v.depth).collect();
        assert_eq!(depths, vec![0, 1, 2, 2, 3]);
        assert_eq!(doc.node_count(), 5);
    }

    #[test]
    fn locate_finds_nested_node() {
        let doc = sample();
        let found = doc.locate(&NodeId::from("s2")).unwrap();
        assert_eq!(found.node_type, NodeType::Sampler);
        assert!(doc.locate(&NodeId::from("missing")).is_none());
    }

    #[test]
    fn locate_mut_edits_in_place() {
        let mut doc = sample();
        doc.locate_mut(&NodeId::from("c1")).unwrap().test_name = "renamed".to_string();
        assert_eq!(doc.locate(&NodeId::from("c1")).unwrap().test_name, "renamed");
    }

    #[test]
    fn remove_takes_subtree() {
        let mut doc = sample();
        let removed = doc.remove(&NodeId::from("c1")).unwrap();
        assert_eq!(removed.children.len(), 1);
        assert_eq!(ids(&doc), vec!["tp", "tg", "s1"]);
        assert!(doc.remove(&NodeId::from("c1")).is_none());
    }

    #[test]
    fn remove_root() {
        let mut doc = sample();
        assert!(doc.remove(&NodeId::from("tp")).is_some());
        assert!(doc.is_empty());
    }

    #[test]
    fn remove_first_match_only() {
        let mut doc = ScriptDocument::new(vec![
            node("dup", NodeType::Sampler, vec![]),
            node("dup", NodeType::Controller, vec![]),
        ]);
        doc.remove(&NodeId::from("dup"));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.roots()[0].node_type, NodeType::Controller);
    }

    #[test]
    fn retain_skips_removed_subtrees() {
        let mut doc = sample();
        let mut visited = Vec::new();
        let removed = doc.retain_nodes(|node, _| {
            visited.push(node.id().to_string());
            node.node_type != NodeType::Controller
        });
        assert_eq!(removed, 1);
        assert_eq!(visited, vec!["tp", "tg", "s1", "c1"]);
        assert_eq!(ids(&doc), vec!["tp", "tg", "s1"]);
    }

    #[test]
    fn for_each_mut_reports_depth() {
        let mut doc = sample();
        doc.for_each_mut(|node, depth| node.test_name = depth.to_string());
        let labels: Vec<_> = doc.iter().map(|v| v.node.test_name.clone()).collect();
        assert_eq!(labels, vec!["0", "1", "2", "2", "3"]);
    }
}
