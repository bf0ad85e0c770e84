//! Selector evaluation
//!
//! Evaluation is an explicit pre-order walk of the document: results come
//! back in document order, children in stored order.

use std::cmp::Ordering;

use script_tree::{FieldValue, Preorder, ScriptDocument, ScriptNode, Visit};
use serde_json::Value;

use crate::ast::{CompareOp, Descent, FieldRef, Literal, Predicate, Scope, Selector, Target};

/// One selected node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match<'a> {
    /// Matching node
    pub node: &'a ScriptNode,
    /// Depth of the node (roots are 0)
    pub depth: usize,
    /// Targeted member, when the selector selects a member
    pub value: Option<FieldValue<'a>>,
}

impl Selector {
    /// Check if a node at `depth` is reachable through this selector's axis
    #[inline]
    #[must_use]
    pub fn admits_depth(&self, depth: usize) -> bool {
        match (self.descent(), self.scope()) {
            (Descent::Recursive, Scope::Any) => true,
            (Descent::Recursive, Scope::Children) => depth >= 1,
            (Descent::Direct, Scope::Any) => depth == 0,
            (Descent::Direct, Scope::Children) => depth == 1,
        }
    }

    /// Check filters and target member, ignoring position
    #[must_use]
    pub fn matches(&self, node: &ScriptNode) -> bool {
        self.filters().iter().all(|predicate| predicate.holds(node))
            && match self.target() {
                Target::Node => true,
                Target::Field(name) => node.has_field(name),
            }
    }

    /// Check a node at a known depth
    #[inline]
    #[must_use]
    pub fn matches_at(&self, node: &ScriptNode, depth: usize) -> bool {
        self.admits_depth(depth) && self.matches(node)
    }

    /// Evaluate against a document
    #[inline]
    #[must_use]
    pub fn select<'s, 'a>(&'s self, doc: &'a ScriptDocument) -> Matches<'s, 'a> {
        self.select_from(doc.roots())
    }

    /// Evaluate treating `nodes` as the root sequence
    #[inline]
    #[must_use]
    pub fn select_from<'s, 'a>(&'s self, nodes: &'a [ScriptNode]) -> Matches<'s, 'a> {
        Matches {
            selector: self,
            walk: Preorder::over(nodes),
        }
    }

    /// Matching nodes in document order
    #[must_use]
    pub fn select_nodes<'a>(&self, doc: &'a ScriptDocument) -> Vec<&'a ScriptNode> {
        self.select(doc).map(|found| found.node).collect()
    }

    /// Number of matches
    #[must_use]
    pub fn count(&self, doc: &ScriptDocument) -> usize {
        self.select(doc).count()
    }
}

/// Iterator over the matches of a selector
#[derive(Debug, Clone)]
pub struct Matches<'s, 'a> {
    selector: &'s Selector,
    walk: Preorder<'a>,
}

impl<'a> Iterator for Matches<'_, 'a> {
    type Item = Match<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let selector = self.selector;
        self.walk.find_map(|Visit { node, depth }| {
            if !selector.matches_at(node, depth) {
                return None;
            }
            let value = selector.target_field().and_then(|name| node.field(name));
            Some(Match { node, depth, value })
        })
    }
}

impl FieldRef {
    /// Resolve against a node; `None` when the member or entry is missing
    #[must_use]
    pub fn resolve<'a>(&self, node: &'a ScriptNode) -> Option<FieldValue<'a>> {
        let value = node.field(self.name())?;
        match self.key() {
            Some(key) => value.entry(key),
            None => Some(value),
        }
    }
}

impl Predicate {
    /// Evaluate against one node
    #[must_use]
    pub fn holds(&self, node: &ScriptNode) -> bool {
        match self {
            Self::Exists(field) => field.resolve(node).is_some(),
            Self::Compare { field, op, value } => field
                .resolve(node)
                .is_some_and(|actual| compare(actual, *op, value)),
        }
    }
}

fn compare(actual: FieldValue<'_>, op: CompareOp, expected: &Literal) -> bool {
    match op {
        CompareOp::Eq => equals(actual, expected),
        CompareOp::Ne => !equals(actual, expected),
        CompareOp::Lt => order(actual, expected).is_some_and(Ordering::is_lt),
        CompareOp::Le => order(actual, expected).is_some_and(Ordering::is_le),
        CompareOp::Gt => order(actual, expected).is_some_and(Ordering::is_gt),
        CompareOp::Ge => order(actual, expected).is_some_and(Ordering::is_ge),
    }
}

#[allow(clippy::float_cmp)]
fn equals(actual: FieldValue<'_>, expected: &Literal) -> bool {
    match expected {
        Literal::Str(text) => actual.as_text() == Some(text.as_str()),
        Literal::Num(n) => match actual {
            FieldValue::Json(Value::Number(number)) => number.as_f64() == Some(*n),
            _ => false,
        },
        Literal::Bool(b) => matches!(actual, FieldValue::Json(Value::Bool(v)) if v == b),
        Literal::Null => matches!(actual, FieldValue::Json(Value::Null)),
    }
}

/// Numeric when both sides read as numbers, lexicographic for two strings
fn order(actual: FieldValue<'_>, expected: &Literal) -> Option<Ordering> {
    match expected {
        Literal::Num(n) => actual.as_f64()?.partial_cmp(n),
        Literal::Str(text) => match (actual.as_f64(), text.trim().parse::<f64>()) {
            (Some(lhs), Ok(rhs)) => lhs.partial_cmp(&rhs),
            _ => Some(actual.as_text()?.cmp(text.as_str())),
        },
        Literal::Bool(_) | Literal::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use script_tree::{NodeId, NodeType};
    use serde_json::json;

    fn node(id: &str, node_type: NodeType, children: Vec<ScriptNode>) -> ScriptNode {
        ScriptNode::builder(id.to_uppercase(), node_type, id)
            .children(children)
            .build()
    }

    /// tp -> tg -> [s1, c1 -> [s2, c2]]
    fn sample() -> ScriptDocument {
        let s1 = ScriptNode::builder("HTTPSamplerProxy", NodeType::Sampler, "s1")
            .prop("HTTPSampler.connect_timeout", "15000")
            .prop("HTTPSampler.method", "GET")
            .identification("http#/a#GET")
            .build();
        let s2 = ScriptNode::builder("HTTPSamplerProxy", NodeType::Sampler, "s2")
            .prop("HTTPSampler.connect_timeout", 500)
            .extra("enabled", false)
            .build();
        ScriptDocument::new(vec![node(
            "tp",
            NodeType::TestPlan,
            vec![node(
                "tg",
                NodeType::ThreadGroup,
                vec![
                    s1,
                    node(
                        "c1",
                        NodeType::Controller,
                        vec![s2, node("c2", NodeType::Controller, vec![])],
                    ),
                ],
            )],
        )])
    }

    fn ids(selector: &str, doc: &ScriptDocument) -> Vec<String> {
        Selector::parse(selector)
            .unwrap()
            .select(doc)
            .map(|found| found.node.id().to_string())
            .collect()
    }

    #[test]
    fn recursive_field_selects_nodes_with_member() {
        let doc = sample();
        assert_eq!(ids("$..props", &doc), vec!["s1", "s2"]);
        assert_eq!(ids("$..identification", &doc), vec!["s1"]);
    }

    #[test]
    fn field_match_carries_value() {
        let doc = sample();
        let selector = Selector::parse("$..identification").unwrap();
        let found: Vec<_> = selector.select(&doc).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value.and_then(|v| v.as_text()), Some("http#/a#GET"));
        assert_eq!(found[0].depth, 2);
    }

    #[test]
    fn equality_filter_on_id() {
        let doc = sample();
        let selector = Selector::descendants().filter(Predicate::id(&NodeId::from("c1")));
        assert_eq!(selector.select_nodes(&doc).len(), 1);
        assert_eq!(ids("$..[?(@.xpathMd5=='missing')]", &doc), Vec::<String>::new());
    }

    #[test]
    fn children_axis_excludes_roots() {
        let doc = sample();
        assert_eq!(ids("$..children", &doc), vec!["tg", "s1", "c1", "s2", "c2"]);
        assert_eq!(
            ids("$..children[?(@.type=='CONTROLLER')]", &doc),
            vec!["c1", "c2"]
        );
        assert_eq!(ids("$..[?(@.type=='TEST_PLAN')]", &doc), vec!["tp"]);
        assert_eq!(ids("$..children[?(@.type=='TEST_PLAN')]", &doc), Vec::<String>::new());
    }

    #[test]
    fn direct_descent_stays_at_top() {
        let doc = sample();
        assert_eq!(ids("$[*]", &doc), vec!["tp"]);
        assert_eq!(ids("$.children", &doc), vec!["tg"]);
    }

    #[test]
    fn results_follow_document_order() {
        let doc = sample();
        assert_eq!(ids("$..[*]", &doc), vec!["tp", "tg", "s1", "c1", "s2", "c2"]);
    }

    #[test]
    fn numeric_comparison_reads_numeric_strings() {
        let doc = sample();
        assert_eq!(
            ids("$..[?(@.props['HTTPSampler.connect_timeout'] > 1000)]", &doc),
            vec!["s1"]
        );
        assert_eq!(
            ids("$..[?(@.props['HTTPSampler.connect_timeout'] <= 15000)]", &doc),
            vec!["s1", "s2"]
        );
        assert_eq!(
            ids("$..[?(@.props['HTTPSampler.connect_timeout'] >= '600')]", &doc),
            vec!["s1"]
        );
    }

    #[test]
    fn numeric_equality_requires_number() {
        let doc = sample();
        assert_eq!(ids("$..[?(@.props['HTTPSampler.connect_timeout'] == 500)]", &doc), vec!["s2"]);
        assert_eq!(
            ids("$..[?(@.props['HTTPSampler.connect_timeout'] == 15000)]", &doc),
            Vec::<String>::new()
        );
    }

    #[test]
    fn lexicographic_comparison_for_strings() {
        let doc = sample();
        assert_eq!(ids("$..[?(@.props.HTTPSampler < 'z')]", &doc), Vec::<String>::new());
        assert_eq!(
            ids("$..children[?(@.xpathMd5 < 'c9')]", &doc),
            vec!["c1", "c2"]
        );
    }

    #[test]
    fn missing_field_fails_every_test() {
        let doc = sample();
        assert_eq!(ids("$..[?(@.identification != 'x')]", &doc), vec!["s1"]);
        assert_eq!(ids("$..[?(@.props['nope'] != 1)]", &doc), Vec::<String>::new());
    }

    #[test]
    fn ne_is_true_for_mismatched_kinds() {
        let doc = sample();
        assert_eq!(ids("$..[?(@.type != 1 && @.props)]", &doc), vec!["s1", "s2"]);
    }

    #[test]
    fn boolean_and_extra_members() {
        let doc = sample();
        assert_eq!(ids("$..[?(@.enabled == false)]", &doc), vec!["s2"]);
        assert_eq!(ids("$..enabled", &doc), vec!["s2"]);
    }

    #[test]
    fn conjunction_requires_every_test() {
        let doc = sample();
        assert_eq!(
            ids("$..[?(@.type=='SAMPLER' && @.props['HTTPSampler.method']=='GET')]", &doc),
            vec!["s1"]
        );
    }

    #[test]
    fn select_from_treats_slice_as_roots() {
        let doc = sample();
        let group = doc.locate(&NodeId::from("tg")).unwrap();
        let selector = Selector::roots().filter(Predicate::node_type(&NodeType::Controller));
        let found: Vec<_> = selector
            .select_from(&group.children)
            .map(|m| m.node.id().to_string())
            .collect();
        assert_eq!(found, vec!["c1"]);
    }

    #[test]
    fn count_matches() {
        let doc = sample();
        assert_eq!(Selector::children().count(&doc), 5);
        assert_eq!(Selector::descendants().with_field("props").count(&doc), 2);
    }

    #[test]
    fn resolve_prop_entry() {
        let doc = sample();
        let s1 = doc.locate(&NodeId::from("s1")).unwrap();
        let field = FieldRef::entry("props", "HTTPSampler.method");
        assert_eq!(field.resolve(s1).map(|v| v.to_value()), Some(json!("GET")));
    }
}
