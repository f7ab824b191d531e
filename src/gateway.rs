//! Protected exchange orchestration
//!
//! `PromptGuard` wires a recognizer, the masking engine and a downstream
//! processor into one call: analyze → mask → process → unmask. It holds
//! only immutable configuration and the two collaborators; each exchange
//! carries its own mapping from mask to unmask.

use crate::config::GuardConfig;
use crate::engine::{MaskResult, MaskingEngine};
use crate::error::{GuardError, Result};
use crate::mapping::Mapping;
use crate::processor::DownstreamProcessor;
use crate::recognizer::pattern::PatternRecognizer;
use crate::recognizer::EntityRecognizer;
use crate::span::Span;
use crate::types::{GuardRequest, GuardResponse};
use std::collections::HashSet;

/// Prompt guard backed by pluggable recognition and processing
pub struct PromptGuard {
    config: GuardConfig,
    allowed: HashSet<String>,
    engine: MaskingEngine,
    recognizer: Box<dyn EntityRecognizer>,
    processor: Box<dyn DownstreamProcessor>,
}

impl PromptGuard {
    /// Create a guard from validated configuration and collaborators
    pub fn new(
        config: GuardConfig,
        recognizer: impl EntityRecognizer + 'static,
        processor: impl DownstreamProcessor + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let engine = MaskingEngine::from_config(&config)?;

        Ok(Self {
            allowed: config.allowed_entities(),
            config,
            engine,
            recognizer: Box::new(recognizer),
            processor: Box::new(processor),
        })
    }

    /// Create a guard using the configured pattern rules as recognizer
    pub fn with_patterns(
        config: GuardConfig,
        processor: impl DownstreamProcessor + 'static,
    ) -> Result<Self> {
        let recognizer = PatternRecognizer::new(&config.patterns)?;
        Self::new(config, recognizer, processor)
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn engine(&self) -> &MaskingEngine {
        &self.engine
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    pub fn processor_name(&self) -> &str {
        self.processor.name()
    }

    /// Run entity recognition for the configured allow-list
    pub async fn analyze(&self, text: &str) -> Result<Vec<Span>> {
        self.recognizer.analyze(text, &self.allowed).await
    }

    /// Detect and mask sensitive spans
    pub async fn protect(&self, text: &str) -> Result<MaskResult> {
        let spans = self.analyze(text).await?;
        self.engine.mask(text, &spans)
    }

    /// Restore placeholders from a mapping
    pub fn restore(&self, text: &str, mapping: &Mapping) -> String {
        self.engine.unmask(text, mapping)
    }

    /// Call the downstream processor, enforcing the configured timeout
    ///
    /// Every failure surfaces as `Downstream` or `Timeout`.
    pub async fn process(&self, masked_text: &str) -> Result<String> {
        let call = self.processor.process(masked_text);
        let outcome = match self.config.downstream_timeout() {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                GuardError::Timeout(format!(
                    "Downstream processor '{}' did not respond within {}s",
                    self.processor.name(),
                    limit.as_secs()
                ))
            })?,
            None => call.await,
        };

        outcome.map_err(|e| {
            tracing::warn!(processor = self.processor.name(), error = %e, "Downstream call failed");
            if e.is_downstream() {
                e
            } else {
                GuardError::Downstream(e.to_string())
            }
        })
    }

    /// Run one exchange
    ///
    /// With protection disabled the message goes downstream untouched.
    /// With protection enabled, any recognition or masking failure aborts
    /// the exchange before the downstream processor is called.
    pub async fn handle(&self, request: &GuardRequest) -> Result<GuardResponse> {
        let original = request.message.clone();

        if !request.enable_protection {
            let raw_output = self.process(&original).await?;
            tracing::info!(protected = false, "Exchange completed");
            return Ok(GuardResponse {
                masked_prompt: original.clone(),
                original,
                final_response: raw_output.clone(),
                raw_output,
            });
        }

        let masked = self.protect(&original).await?;
        let raw_output = self.process(&masked.safe_text).await?;
        let final_response = self.restore(&raw_output, &masked.mapping);

        tracing::info!(
            protected = true,
            masked = masked.mapping.len(),
            "Exchange completed"
        );

        Ok(GuardResponse {
            original,
            masked_prompt: masked.safe_text,
            raw_output,
            final_response,
        })
    }
}
