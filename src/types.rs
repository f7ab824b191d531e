//! Boundary types exchanged with a transport layer
//!
//! Field names are snake_case on the wire. Aliases accept the older
//! `enable_guard` / `ai_raw_response` spellings.

use serde::{Deserialize, Serialize};

/// A request to run one protected exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRequest {
    /// User text to send downstream
    pub message: String,

    /// Mask sensitive spans before the downstream call
    #[serde(default = "default_enable_protection", alias = "enable_guard")]
    pub enable_protection: bool,
}

fn default_enable_protection() -> bool {
    true
}

impl GuardRequest {
    /// Create a protected request
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            enable_protection: true,
        }
    }

    /// Create a request that bypasses masking
    pub fn unprotected(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            enable_protection: false,
        }
    }
}

/// The four views of one exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardResponse {
    /// Text as received from the user
    pub original: String,

    /// Text actually sent downstream
    pub masked_prompt: String,

    /// Downstream output before restoration
    #[serde(alias = "ai_raw_response")]
    pub raw_output: String,

    /// Downstream output with placeholders restored
    pub final_response: String,
}

impl GuardResponse {
    /// Whether anything was redacted before the downstream call
    pub fn was_masked(&self) -> bool {
        self.masked_prompt != self.original
    }
}
