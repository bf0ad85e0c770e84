//! Selector compilation errors

/// Errors raised while compiling a selector
///
/// Positions are byte offsets into the trimmed selector text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Selector text is empty
    #[error("selector is empty")]
    Empty,

    /// Selector does not start at the document root
    #[error("selector must start with '$'")]
    MissingRoot,

    /// Unexpected character or end of input
    #[error("expected {expected} at position {position}, found {found}")]
    Unexpected {
        position: usize,
        expected: &'static str,
        found: String,
    },

    /// String literal without closing quote
    #[error("unterminated string literal starting at position {position}")]
    UnterminatedString { position: usize },

    /// Number literal that does not parse
    #[error("invalid number '{literal}' at position {position}")]
    InvalidNumber { position: usize, literal: String },

    /// Operator outside the supported subset
    #[error("unsupported operator '{operator}' at position {position}")]
    Unsupported {
        position: usize,
        operator: &'static str,
    },

    /// Input left after a complete selector
    #[error("unexpected trailing input '{rest}' at position {position}")]
    Trailing { position: usize, rest: String },
}

impl SelectorError {
    /// Byte offset of the problem, when known
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Empty | Self::MissingRoot => None,
            Self::Unexpected { position, .. }
            | Self::UnterminatedString { position }
            | Self::InvalidNumber { position, .. }
            | Self::Unsupported { position, .. }
            | Self::Trailing { position, .. } => Some(*position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unexpected_display() {
        let err = SelectorError::Unexpected {
            position: 3,
            expected: "field name",
            found: "'#'".to_string(),
        };
        assert_eq!(err.to_string(), "expected field name at position 3, found '#'");
        assert_eq!(err.position(), Some(3));
    }

    #[test]
    fn empty_has_no_position() {
        assert_eq!(SelectorError::Empty.position(), None);
    }
}
