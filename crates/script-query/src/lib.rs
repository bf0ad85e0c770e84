//! Path Query Language
//!
//! A small closed selector language for addressing nodes of a
//! [`ScriptDocument`](script_tree::ScriptDocument):
//!
//! | selector | selects |
//! |---|---|
//! | `$..props` | every node, at any depth, with `props` set |
//! | `$..[?(@.xpathMd5=='<id>')]` | every node whose member equals the value |
//! | `$..children[?(@.type=='SAMPLER')]` | nodes held in some `children` list, filtered |
//! | `$..[?(@.props['k'] > 100)]` | numeric comparison on a prop entry |
//! | `$[*]`, `$.children` | roots, children of roots |
//!
//! Filters are conjunctions (`&&`) of existence tests and comparisons
//! (`==`, `!=`, `<`, `<=`, `>`, `>=`). A trailing `.field` selects that
//! member of each matching node.
//!
//! Selectors are compiled once into a [`Selector`] and evaluated by an
//! explicit pre-order walk, so results come back in document order.
//!
//! # Example
//!
//! ```
//! use script_query::{Predicate, Selector};
//! use script_tree::NodeType;
//!
//! let parsed = Selector::parse("$..children[?(@.type=='SAMPLER')]")?;
//! let built = Selector::children().filter(Predicate::node_type(&NodeType::Sampler));
//! assert_eq!(parsed, built);
//! assert_eq!(built.to_string(), "$..children[?(@.type=='SAMPLER')]");
//! # Ok::<(), script_query::SelectorError>(())
//! ```

#![warn(unreachable_pub)]

mod ast;
mod error;
mod eval;
mod parser;

pub use ast::{
    CompareOp, Descent, FieldRef, Literal, Predicate, Scope, Selector, Target, CHILDREN_AXIS,
};
pub use error::SelectorError;
pub use eval::{Match, Matches};
