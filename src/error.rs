//! Error types for a3s-prompt-guard

use thiserror::Error;

/// Errors that can occur while protecting an exchange
#[derive(Debug, Error)]
pub enum GuardError {
    /// Span with inverted or out-of-range bounds
    ///
    /// The whole masking call fails; spans are never clamped.
    #[error(
        "Malformed span '{entity_type}' [{start}, {end}) for text of {text_len} chars: {reason}"
    )]
    MalformedSpan {
        entity_type: String,
        start: usize,
        end: usize,
        text_len: usize,
        reason: String,
    },

    /// Entity type name that cannot be embedded in a placeholder
    #[error("Invalid entity type '{0}': expected ASCII letters, digits and underscores")]
    InvalidEntityType(String),

    /// Custom pattern failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Entity recognition backend failure
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// Downstream processor call failed
    #[error("Downstream processor error: {0}")]
    Downstream(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mapping seal/open failure
    #[error("Seal error: {0}")]
    Seal(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GuardError {
    /// Whether the failure happened at the downstream processor
    ///
    /// Masking had already succeeded when this is true, so the caller
    /// may retry the exchange under its own policy.
    pub fn is_downstream(&self) -> bool {
        matches!(self, Self::Downstream(_) | Self::Timeout(_))
    }
}

/// Result type alias for guard operations
pub type Result<T> = std::result::Result<T, GuardError>;
