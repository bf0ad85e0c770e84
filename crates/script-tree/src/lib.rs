//! Script Tree Model
//!
//! Typed representation of a load-test scenario normalized from a recorded
//! script into a hierarchical JSON tree.
//!
//! # Core Concepts
//!
//! - [`ScriptNode`]: one element of the plan (thread group, controller, sampler, ...)
//! - [`NodeType`]: open set of node kinds
//! - [`NodeId`]: opaque `xpathMd5` identifier, the only addressing key
//! - [`ScriptDocument`]: ordered forest of root nodes with traversal and edit primitives
//!
//! # Example
//!
//! ```
//! use script_tree::{NodeId, NodeType, ScriptDocument};
//!
//! let text = r#"[{
//!     "name": "TestPlan", "testName": "Test Plan", "md5": "5e2a", "type": "TEST_PLAN",
//!     "xpath": "/jmeterTestPlan/hashTree/TestPlan", "xpathMd5": "0f1a", "children": []
//! }]"#;
//!
//! let doc = ScriptDocument::from_json(text)?;
//! let plan = doc.locate(&NodeId::from("0f1a")).expect("plan node");
//! assert_eq!(plan.node_type, NodeType::TestPlan);
//! # Ok::<(), script_tree::DocumentError>(())
//! ```

#![warn(unreachable_pub)]

// Core modules
mod document;
mod error;
mod id;
mod node;

// Re-exports
pub use document::{Preorder, ScriptDocument, Visit};
pub use error::{DocumentError, FieldError};
pub use id::NodeId;
pub use node::{fields, FieldValue, NodeBuilder, NodeType, Props, ScriptNode};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
