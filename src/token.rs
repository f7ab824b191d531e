//! Placeholder allocation
//!
//! Tokens have the shape `<ENTITY_TYPE_n>`. Entity type names are restricted
//! to ASCII letters, digits and underscores, so `<` and `>` only ever appear
//! as the outer delimiters. That makes it impossible for one token to be a
//! substring of another (`<ID_1>` never occurs inside `<THAI_ID_1>`, and
//! `<ID_1>` never occurs inside `<ID_11>`).

use crate::error::{GuardError, Result};
use std::collections::HashMap;

/// Opening delimiter of every placeholder
pub const TOKEN_OPEN: char = '<';

/// Closing delimiter of every placeholder
pub const TOKEN_CLOSE: char = '>';

/// Check whether an entity type name can be embedded in a placeholder
pub fn is_valid_entity_type(entity_type: &str) -> bool {
    !entity_type.is_empty()
        && entity_type
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Validate an entity type name, returning it unchanged on success
pub fn validate_entity_type(entity_type: &str) -> Result<&str> {
    if is_valid_entity_type(entity_type) {
        Ok(entity_type)
    } else {
        Err(GuardError::InvalidEntityType(entity_type.to_string()))
    }
}

/// Format the placeholder for the `n`-th span of an entity type
pub fn format_token(entity_type: &str, n: u32) -> String {
    format!("{}{}_{}{}", TOKEN_OPEN, entity_type, n, TOKEN_CLOSE)
}

/// Per-call token allocator
///
/// Numbering starts at 1 and increments independently per entity type.
/// An allocator lives for exactly one masking call; it is never shared.
#[derive(Debug, Default)]
pub struct TokenAllocator {
    counters: HashMap<String, u32>,
}

impl TokenAllocator {
    /// Create an allocator with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next token for an entity type
    pub fn allocate(&mut self, entity_type: &str) -> String {
        let counter = self.counters.entry(entity_type.to_string()).or_insert(0);
        *counter += 1;
        format_token(entity_type, *counter)
    }

    /// Number of tokens allocated so far for an entity type
    pub fn count(&self, entity_type: &str) -> u32 {
        self.counters.get(entity_type).copied().unwrap_or(0)
    }

    /// Number of tokens allocated across all entity types
    pub fn total(&self) -> u32 {
        self.counters.values().sum()
    }
}
