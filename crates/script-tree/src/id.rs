//! Node identifiers
//!
//! Provides [`NodeId`], the opaque `xpathMd5` identifier used to address
//! nodes within a script tree.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Stable identifier of a script node (`xpathMd5`)
///
/// Computed upstream from the node's structural position. The tree model only
/// relies on equality; the value is never recomputed or validated here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create identifier from any string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if identifier is empty or whitespace only
    ///
    /// Blank identifiers never address a node.
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Consume into the underlying string
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_display() {
        let id = NodeId::new("0f1a197a2040e645dcdb4dfff8a3f960");
        assert_eq!(id.to_string(), "0f1a197a2040e645dcdb4dfff8a3f960");
    }

    #[test]
    fn node_id_blank() {
        assert!(NodeId::new("").is_blank());
        assert!(NodeId::new("  \t").is_blank());
        assert!(!NodeId::new("a").is_blank());
    }

    #[test]
    fn node_id_compares_with_str() {
        let id = NodeId::from("abc");
        assert_eq!(id, "abc");
        assert_ne!(id, "abd");
    }

    #[test]
    fn node_id_serializes_transparently() {
        let id = NodeId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc""#);
        let back: NodeId = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(back, id);
    }
}
