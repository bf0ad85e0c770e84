//! Selector syntax tree
//!
//! A [`Selector`] is a closed-form description of a node set: where
//! candidates come from ([`Descent`] and [`Scope`]), which conjunction of
//! [`Predicate`]s they must satisfy, and whether the selection is the node
//! itself or one of its members ([`Target`]).

use std::fmt::{self, Display, Formatter, Write as _};
use std::str::FromStr;

use script_tree::{NodeId, NodeType};

use crate::error::SelectorError;
use crate::parser;

/// Reserved step naming the `children` axis
pub const CHILDREN_AXIS: &str = "children";

/// How far below the root sequence candidates are taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descent {
    /// Root sequence only (`$[...]`, `$.children`)
    Direct,
    /// Any depth (`$..`)
    Recursive,
}

/// Which collection candidates must belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every node reached by the descent
    Any,
    /// Only nodes held in some node's `children` list
    Children,
}

/// Comparison operator of a filter test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Operator token
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Literal operand of a filter test
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted string
    Str(String),
    /// Number
    Num(f64),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<i64> for Literal {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Num(value as f64)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&NodeType> for Literal {
    fn from(value: &NodeType) -> Self {
        Self::Str(value.as_str().to_string())
    }
}

impl From<&NodeId> for Literal {
    fn from(value: &NodeId) -> Self {
        Self::Str(value.as_str().to_string())
    }
}

/// Member referenced by a filter test (`@.name` or `@.name['key']`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    name: String,
    key: Option<String>,
}

impl FieldRef {
    /// Reference a node member
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
        }
    }

    /// Reference one entry of an object member, e.g. a prop
    #[inline]
    #[must_use]
    pub fn entry(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: Some(key.into()),
        }
    }

    /// Member name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry key within the member
    #[inline]
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// One test of a filter; a filter holds a conjunction of them
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Member is set (`@.identification`)
    Exists(FieldRef),
    /// Member compared with a literal (`@.type=='SAMPLER'`)
    Compare {
        field: FieldRef,
        op: CompareOp,
        value: Literal,
    },
}

impl Predicate {
    /// Member is set
    #[inline]
    #[must_use]
    pub fn exists(field: impl Into<FieldRef>) -> Self {
        Self::Exists(field.into())
    }

    /// Member compared with a literal
    #[inline]
    #[must_use]
    pub fn compare(field: impl Into<FieldRef>, op: CompareOp, value: impl Into<Literal>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Member equals a literal
    #[inline]
    #[must_use]
    pub fn eq(field: impl Into<FieldRef>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    /// Member differs from a literal
    #[inline]
    #[must_use]
    pub fn ne(field: impl Into<FieldRef>, value: impl Into<Literal>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    /// Node has the given id
    #[inline]
    #[must_use]
    pub fn id(id: &NodeId) -> Self {
        Self::eq(script_tree::fields::XPATH_MD5, id)
    }

    /// Node has the given kind
    #[inline]
    #[must_use]
    pub fn node_type(node_type: &NodeType) -> Self {
        Self::eq(script_tree::fields::TYPE, node_type)
    }
}

/// What a selector yields for a matching node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// The node itself
    Node,
    /// One member of the node; only nodes with the member set match
    Field(String),
}

/// Compiled selector
///
/// Plain data: compile once, evaluate against any number of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    descent: Descent,
    scope: Scope,
    filters: Vec<Predicate>,
    target: Target,
}

impl Selector {
    /// Every node at any depth (`$..[*]`)
    #[inline]
    #[must_use]
    pub fn descendants() -> Self {
        Self::with_axis(Descent::Recursive, Scope::Any)
    }

    /// Every node held in some `children` list (`$..children`)
    #[inline]
    #[must_use]
    pub fn children() -> Self {
        Self::with_axis(Descent::Recursive, Scope::Children)
    }

    /// Root nodes (`$[*]`)
    #[inline]
    #[must_use]
    pub fn roots() -> Self {
        Self::with_axis(Descent::Direct, Scope::Any)
    }

    /// Children of root nodes (`$.children`)
    #[inline]
    #[must_use]
    pub fn root_children() -> Self {
        Self::with_axis(Descent::Direct, Scope::Children)
    }

    /// Selector over an explicit axis
    #[inline]
    #[must_use]
    pub fn with_axis(descent: Descent, scope: Scope) -> Self {
        Self {
            descent,
            scope,
            filters: Vec::new(),
            target: Target::Node,
        }
    }

    /// Compile selector text
    ///
    /// # Errors
    /// Returns [`SelectorError`] describing the first syntax problem
    #[inline]
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        parser::parse(text)
    }

    /// Add a filter test
    #[inline]
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Select a member of matching nodes instead of the nodes
    #[inline]
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.target = Target::Field(field.into());
        self
    }

    /// Descent mode
    #[inline]
    #[must_use]
    pub fn descent(&self) -> Descent {
        self.descent
    }

    /// Collection scope
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Filter tests (all must hold)
    #[inline]
    #[must_use]
    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    /// Selection target
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Targeted member name, if the selector selects a member
    #[inline]
    #[must_use]
    pub fn target_field(&self) -> Option<&str> {
        match &self.target {
            Target::Node => None,
            Target::Field(name) => Some(name),
        }
    }

    pub(crate) fn push_filter(&mut self, predicate: Predicate) {
        self.filters.push(predicate);
    }

    pub(crate) fn set_target(&mut self, target: Target) {
        self.target = target;
    }

    pub(crate) fn set_scope(&mut self, scope: Scope) {
        self.scope = scope;
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self.descent {
            Descent::Direct => "$",
            Descent::Recursive => "$..",
        })?;

        if self.scope == Scope::Children {
            if self.descent == Descent::Direct {
                f.write_char('.')?;
            }
            f.write_str(CHILDREN_AXIS)?;
            write_filter(f, &self.filters, false)?;
            return write_target(f, &self.target);
        }

        match (&self.target, self.filters.is_empty(), self.descent) {
            (Target::Field(name), true, Descent::Recursive) if name != CHILDREN_AXIS => {
                f.write_str(name)
            }
            (Target::Field(name), true, Descent::Direct) if name != CHILDREN_AXIS => {
                write!(f, ".{name}")
            }
            _ => {
                write_filter(f, &self.filters, true)?;
                write_target(f, &self.target)
            }
        }
    }
}

fn write_filter(f: &mut Formatter<'_>, filters: &[Predicate], wildcard: bool) -> fmt::Result {
    if filters.is_empty() {
        return if wildcard { f.write_str("[*]") } else { Ok(()) };
    }
    f.write_str("[?(")?;
    for (i, predicate) in filters.iter().enumerate() {
        if i > 0 {
            f.write_str(" && ")?;
        }
        write!(f, "{predicate}")?;
    }
    f.write_str(")]")
}

fn write_target(f: &mut Formatter<'_>, target: &Target) -> fmt::Result {
    match target {
        Target::Node => Ok(()),
        Target::Field(name) => write!(f, ".{name}"),
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "@.{}", self.name)?;
        if let Some(key) = &self.key {
            f.write_str("[")?;
            write_quoted(f, key)?;
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists(field) => write!(f, "{field}"),
            Self::Compare { field, op, value } => write!(f, "{field}{}{value}", op.as_str()),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(text) => write_quoted(f, text),
            Self::Num(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Null => f.write_str("null"),
        }
    }
}

fn write_quoted(f: &mut Formatter<'_>, text: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('\'')
}
