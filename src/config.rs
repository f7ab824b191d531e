//! Guard configuration
//!
//! An explicit, immutable value handed to the engine, recognizer and
//! gateway constructors. Loaded from JSON or built in code.

use crate::error::{GuardError, Result};
use crate::recognizer::pattern::{default_pattern_rules, PatternRecognizer, PatternRule};
use crate::token::validate_entity_type;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Entity types masked when no allow-list is configured
pub const DEFAULT_ENTITIES: &[&str] = &[
    "PERSON",
    "PHONE_NUMBER",
    "EMAIL_ADDRESS",
    "CREDIT_CARD",
    "THAI_ID",
    "CRYPTO_WALLET",
];

/// Configuration for a prompt guard instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardConfig {
    /// Entity-type allow-list; spans of other types are ignored
    #[serde(default = "default_entities")]
    pub entities: Vec<String>,

    /// Spans scoring below this confidence are ignored
    #[serde(default)]
    pub min_confidence: f64,

    /// Downstream processor timeout in seconds (`None` waits forever)
    #[serde(default = "default_downstream_timeout_secs")]
    pub downstream_timeout_secs: Option<u64>,

    /// Pattern definitions for the regex recognizer
    #[serde(default = "default_pattern_rules")]
    pub patterns: Vec<PatternRule>,
}

fn default_entities() -> Vec<String> {
    DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect()
}

fn default_downstream_timeout_secs() -> Option<u64> {
    Some(30)
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            min_confidence: 0.0,
            downstream_timeout_secs: default_downstream_timeout_secs(),
            patterns: default_pattern_rules(),
        }
    }
}

impl GuardConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GuardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_json_str(&json)?;
        tracing::debug!(
            path = %path.display(),
            entities = config.entities.len(),
            patterns = config.patterns.len(),
            "Guard config loaded"
        );
        Ok(config)
    }

    /// Replace the entity-type allow-list
    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_downstream_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.downstream_timeout_secs = timeout_secs;
        self
    }

    pub fn with_patterns(mut self, patterns: Vec<PatternRule>) -> Self {
        self.patterns = patterns;
        self
    }

    /// The allow-list as a set
    pub fn allowed_entities(&self) -> HashSet<String> {
        self.entities.iter().cloned().collect()
    }

    /// Downstream timeout as a `Duration`
    pub fn downstream_timeout(&self) -> Option<Duration> {
        self.downstream_timeout_secs.map(Duration::from_secs)
    }

    /// Check that the configuration can build a working guard
    pub fn validate(&self) -> Result<()> {
        for entity in &self.entities {
            validate_entity_type(entity)?;
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(GuardError::Config(format!(
                "minConfidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }

        if self.downstream_timeout_secs == Some(0) {
            return Err(GuardError::Config(
                "downstreamTimeoutSecs must be positive".to_string(),
            ));
        }

        PatternRecognizer::new(&self.patterns)?;
        Ok(())
    }
}
