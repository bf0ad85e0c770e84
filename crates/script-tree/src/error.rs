//! Error types for the script tree model

/// Errors while reading or writing a script document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Input text is empty or whitespace only
    #[error("script document is empty")]
    Empty,

    /// Input text is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// Top level is valid JSON but not an array
    #[error("top level of a script document must be an array, found {found}")]
    NotAnArray { found: &'static str },

    /// A root element does not match the node shape
    #[error("malformed node at root index {index}: {source}")]
    MalformedNode {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization back to text failed
    #[error("serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Errors from field-level edits on a node
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Field is part of the mandatory node shape
    #[error("field '{0}' is required and cannot be removed")]
    NotRemovable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_an_array_display() {
        let err = DocumentError::NotAnArray { found: "object" };
        assert_eq!(
            err.to_string(),
            "top level of a script document must be an array, found object"
        );
    }

    #[test]
    fn field_error_display() {
        let err = FieldError::NotRemovable("xpathMd5".to_string());
        assert_eq!(err.to_string(), "field 'xpathMd5' is required and cannot be removed");
    }
}
