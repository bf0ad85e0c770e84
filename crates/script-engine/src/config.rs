//! Engine configuration
//!
//! Loaded from TOML or YAML, or built in code:
//!
//! ```toml
//! default_patterns = ["$..props", "$..identification"]
//! selector_cache_capacity = 512
//! max_document_bytes = 4194304
//! output = "pretty"
//! ```

use script_query::{Selector, SelectorError};
use serde::{Deserialize, Serialize};

/// Patterns applied when sanitizing a document
pub const DEFAULT_PATTERNS: &[&str] = &["$..props"];

/// Compiled selectors kept by default
pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Largest accepted input text by default (10 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// Serialization style of edited documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Single-line JSON
    #[default]
    Compact,
    /// Indented JSON
    Pretty,
}

/// Tree engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Sanitization patterns; `None` uses [`DEFAULT_PATTERNS`]
    pub default_patterns: Option<Vec<String>>,
    /// Selector cache size; 0 disables caching
    pub selector_cache_capacity: u64,
    /// Input size limit in bytes
    pub max_document_bytes: usize,
    /// Output style
    pub output: OutputFormat,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] for malformed text, unknown keys or invalid values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML configuration
    ///
    /// # Errors
    /// Returns [`ConfigError`] for malformed text, unknown keys or invalid values
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// With sanitization patterns
    #[inline]
    #[must_use]
    pub fn with_default_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// With selector cache size
    #[inline]
    #[must_use]
    pub fn with_selector_cache_capacity(mut self, capacity: u64) -> Self {
        self.selector_cache_capacity = capacity;
        self
    }

    /// With input size limit
    #[inline]
    #[must_use]
    pub fn with_max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = limit;
        self
    }

    /// With output style
    #[inline]
    #[must_use]
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    /// Effective sanitization patterns
    #[must_use]
    pub fn default_patterns(&self) -> Vec<String> {
        match &self.default_patterns {
            Some(patterns) => patterns.clone(),
            None => DEFAULT_PATTERNS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Check the configuration
    ///
    /// # Errors
    /// - [`ConfigError::ZeroDocumentLimit`] if no input could ever be accepted
    /// - [`ConfigError::InvalidDefaultPattern`] for a pattern that does not compile
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_document_bytes == 0 {
            return Err(ConfigError::ZeroDocumentLimit);
        }
        for pattern in self.default_patterns.iter().flatten() {
            Selector::parse(pattern).map_err(|source| ConfigError::InvalidDefaultPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_patterns: None,
            selector_cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            output: OutputFormat::Compact,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML text does not describe a configuration
    #[error("invalid TOML configuration: {0}")]
    InvalidToml(#[from] toml::de::Error),

    /// YAML text does not describe a configuration
    #[error("invalid YAML configuration: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// `max_document_bytes` is zero
    #[error("max_document_bytes must be greater than zero")]
    ZeroDocumentLimit,

    /// A sanitization pattern does not compile
    #[error("default pattern '{pattern}' is invalid: {source}")]
    InvalidDefaultPattern {
        pattern: String,
        #[source]
        source: SelectorError,
    },
}
