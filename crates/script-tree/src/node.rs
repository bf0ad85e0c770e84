//! Script node model
//!
//! A [`ScriptNode`] is one element of a recorded load-test plan: the plan
//! itself, a thread group, a controller or a sampler. Nodes nest through
//! `children`, which is always present and possibly empty.
//!
//! The JSON member names follow the upstream converter (`testName`,
//! `xpathMd5`, ...). Members the model does not know are kept in
//! [`ScriptNode::extra`] so a document survives a parse/serialize cycle
//! unchanged.

use std::convert::Infallible;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FieldError;
use crate::id::NodeId;

/// Execution parameters attached to a node
///
/// Keys keep insertion order.
pub type Props = Map<String, Value>;

/// JSON member names of a script node
pub mod fields {
    /// Internal element name
    pub const NAME: &str = "name";
    /// Human-readable label
    pub const TEST_NAME: &str = "testName";
    /// Content hash
    pub const MD5: &str = "md5";
    /// Node kind
    pub const TYPE: &str = "type";
    /// Structural position in the original script
    pub const XPATH: &str = "xpath";
    /// Stable node identifier
    pub const XPATH_MD5: &str = "xpathMd5";
    /// Execution parameters
    pub const PROPS: &str = "props";
    /// Semantic matching key
    pub const IDENTIFICATION: &str = "identification";
    /// Nested nodes
    pub const CHILDREN: &str = "children";

    /// Members every node must carry
    pub const REQUIRED: [&str; 7] = [NAME, TEST_NAME, MD5, TYPE, XPATH, XPATH_MD5, CHILDREN];
}

/// Kind of a script node
///
/// Open set: unknown kinds are kept verbatim in [`NodeType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    /// Root of a recorded plan
    TestPlan,
    /// Group of virtual users
    ThreadGroup,
    /// Branching or grouping element
    Controller,
    /// Element issuing a request
    Sampler,
    /// Any other element kind
    Other(String),
}

impl NodeType {
    /// Wire name of the kind
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TestPlan => "TEST_PLAN",
            Self::ThreadGroup => "THREAD_GROUP",
            Self::Controller => "CONTROLLER",
            Self::Sampler => "SAMPLER",
            Self::Other(name) => name,
        }
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<String> for NodeType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "TEST_PLAN" => Self::TestPlan,
            "THREAD_GROUP" => Self::ThreadGroup,
            "CONTROLLER" => Self::Controller,
            "SAMPLER" => Self::Sampler,
            _ => Self::Other(name),
        }
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

/// One node of a script tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptNode {
    /// Internal element name (engine specific)
    pub name: String,

    /// Human-readable label
    pub test_name: String,

    /// Hash of the node's own content, computed upstream
    pub md5: String,

    /// Node kind
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Structural position in the original script (informational)
    pub xpath: String,

    /// Stable identifier, the only member used for addressing
    pub xpath_md5: NodeId,

    /// Execution parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Props>,

    /// Semantic key such as `protocol#path#method`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<String>,

    /// Nested nodes in stored order
    pub children: Vec<ScriptNode>,

    /// Members not covered by the model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Borrowed view of one node member
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// String member of the model
    Text(&'a str),
    /// Arbitrary JSON value (extra members, prop entries)
    Json(&'a Value),
    /// The `props` object
    Object(&'a Props),
    /// The `children` sequence
    Children(&'a [ScriptNode]),
}

impl<'a> FieldValue<'a> {
    /// String content, if the value is textual
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&'a str> {
        match *self {
            Self::Text(text) => Some(text),
            Self::Json(Value::String(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Numeric content
    ///
    /// Strings holding a number count as numeric; recorded scripts keep most
    /// parameters as text.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Json(Value::Number(n)) => n.as_f64(),
            _ => self.as_text().and_then(|text| text.trim().parse().ok()),
        }
    }

    /// Entry of an object-valued member
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<FieldValue<'a>> {
        match *self {
            Self::Object(map) => map.get(key).map(FieldValue::Json),
            Self::Json(Value::Object(map)) => map.get(key).map(FieldValue::Json),
            _ => None,
        }
    }

    /// Owned JSON copy of the value
    #[must_use]
    pub fn to_value(&self) -> Value {
        match *self {
            Self::Text(text) => Value::String(text.to_string()),
            Self::Json(value) => value.clone(),
            Self::Object(map) => Value::Object(map.clone()),
            Self::Children(children) => serde_json::to_value(children).unwrap_or(Value::Null),
        }
    }
}

impl ScriptNode {
    /// Start building a node
    #[inline]
    #[must_use]
    pub fn builder(name: impl Into<String>, node_type: NodeType, id: impl Into<NodeId>) -> NodeBuilder {
        NodeBuilder::new(name, node_type, id)
    }

    /// Node identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.xpath_md5
    }

    /// Check if node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes below this one
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Direct children of the given kind, in stored order
    pub fn children_of_type<'a>(
        &'a self,
        node_type: &'a NodeType,
    ) -> impl Iterator<Item = &'a ScriptNode> + 'a {
        self.children
            .iter()
            .filter(move |child| &child.node_type == node_type)
    }

    /// Single prop value
    #[inline]
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.as_ref().and_then(|props| props.get(key))
    }

    /// Resolve a member by its JSON name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            fields::NAME => Some(FieldValue::Text(&self.name)),
            fields::TEST_NAME => Some(FieldValue::Text(&self.test_name)),
            fields::MD5 => Some(FieldValue::Text(&self.md5)),
            fields::TYPE => Some(FieldValue::Text(self.node_type.as_str())),
            fields::XPATH => Some(FieldValue::Text(&self.xpath)),
            fields::XPATH_MD5 => Some(FieldValue::Text(self.xpath_md5.as_str())),
            fields::PROPS => self.props.as_ref().map(FieldValue::Object),
            fields::IDENTIFICATION => self.identification.as_deref().map(FieldValue::Text),
            fields::CHILDREN => Some(FieldValue::Children(&self.children)),
            other => self.extra.get(other).map(FieldValue::Json),
        }
    }

    /// Check if a member is set
    #[inline]
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Check if a member belongs to the mandatory shape
    #[inline]
    #[must_use]
    pub fn is_required_field(name: &str) -> bool {
        fields::REQUIRED.contains(&name)
    }

    /// Remove an optional member
    ///
    /// Returns whether the member was set.
    ///
    /// # Errors
    /// Returns [`FieldError::NotRemovable`] for required members.
    pub fn remove_field(&mut self, name: &str) -> Result<bool, FieldError> {
        match name {
            fields::PROPS => Ok(self.props.take().is_some()),
            fields::IDENTIFICATION => Ok(self.identification.take().is_some()),
            other if Self::is_required_field(other) => {
                Err(FieldError::NotRemovable(other.to_string()))
            }
            other => Ok(self.extra.shift_remove(other).is_some()),
        }
    }

    /// Set prop entries, creating `props` when absent
    ///
    /// Existing keys not mentioned are kept. Returns the number of entries set.
    pub fn merge_props<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let props = self.props.get_or_insert_with(Props::new);
        let mut count = 0;
        for (key, value) in entries {
            props.insert(key, value);
            count += 1;
        }
        count
    }
}

/// Builder for [`ScriptNode`]
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    node: ScriptNode,
}

impl NodeBuilder {
    /// Create builder; the label defaults to the name
    #[must_use]
    pub fn new(name: impl Into<String>, node_type: NodeType, id: impl Into<NodeId>) -> Self {
        let name = name.into();
        Self {
            node: ScriptNode {
                test_name: name.clone(),
                name,
                md5: String::new(),
                node_type,
                xpath: String::new(),
                xpath_md5: id.into(),
                props: None,
                identification: None,
                children: Vec::new(),
                extra: Map::new(),
            },
        }
    }

    /// Set label
    #[inline]
    #[must_use]
    pub fn test_name(mut self, test_name: impl Into<String>) -> Self {
        self.node.test_name = test_name.into();
        self
    }

    /// Set content hash
    #[inline]
    #[must_use]
    pub fn md5(mut self, md5: impl Into<String>) -> Self {
        self.node.md5 = md5.into();
        self
    }

    /// Set structural position
    #[inline]
    #[must_use]
    pub fn xpath(mut self, xpath: impl Into<String>) -> Self {
        self.node.xpath = xpath.into();
        self
    }

    /// Add one prop entry
    #[inline]
    #[must_use]
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.node.merge_props([(key.into(), value.into())]);
        self
    }

    /// Set semantic key
    #[inline]
    #[must_use]
    pub fn identification(mut self, identification: impl Into<String>) -> Self {
        self.node.identification = Some(identification.into());
        self
    }

    /// Append a child
    #[inline]
    #[must_use]
    pub fn child(mut self, child: ScriptNode) -> Self {
        self.node.children.push(child);
        self
    }

    /// Append children
    #[inline]
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = ScriptNode>) -> Self {
        self.node.children.extend(children);
        self
    }

    /// Add an extra member
    #[inline]
    #[must_use]
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.node.extra.insert(key.into(), value.into());
        self
    }

    /// Finish building
    #[inline]
    #[must_use]
    pub fn build(self) -> ScriptNode {
        self.node
    }
}
