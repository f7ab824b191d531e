//! Entity recognition — the pluggable detection seam
//!
//! The guard never detects sensitive content itself. It asks an
//! `EntityRecognizer` for candidate spans and leaves validation and overlap
//! resolution to the `SpanNormalizer`. Backends may return spans for types
//! outside the allow-list; the normalizer filters them.

use crate::error::Result;
use crate::span::Span;
use async_trait::async_trait;
use std::collections::HashSet;

pub mod pattern;

/// Core trait for entity recognition backends
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Detect candidate sensitive spans (char offsets) in `text`
    async fn analyze(&self, text: &str, allowed: &HashSet<String>) -> Result<Vec<Span>>;

    /// Backend name (e.g., "pattern", "composite")
    fn name(&self) -> &str;
}

/// Chains several recognizers and concatenates their spans
///
/// Backends run in order. A failing backend fails the whole analysis,
/// since masking on partial detection could under-redact.
pub struct CompositeRecognizer {
    backends: Vec<Box<dyn EntityRecognizer>>,
}

impl CompositeRecognizer {
    pub fn new(backends: Vec<Box<dyn EntityRecognizer>>) -> Self {
        Self { backends }
    }

    /// Append a backend to the chain
    pub fn with(mut self, backend: impl EntityRecognizer + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[async_trait]
impl EntityRecognizer for CompositeRecognizer {
    async fn analyze(&self, text: &str, allowed: &HashSet<String>) -> Result<Vec<Span>> {
        let mut all_spans = Vec::new();
        for backend in &self.backends {
            let spans = backend.analyze(text, allowed).await.map_err(|e| {
                tracing::warn!(backend = backend.name(), error = %e, "Recognizer backend failed");
                e
            })?;
            all_spans.extend(spans);
        }
        Ok(all_spans)
    }

    fn name(&self) -> &str {
        "composite"
    }
}

/// Recognizer that returns a fixed span list
///
/// Useful for replaying detections produced elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRecognizer {
    spans: Vec<Span>,
}

impl StaticRecognizer {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }
}

#[async_trait]
impl EntityRecognizer for StaticRecognizer {
    async fn analyze(&self, _text: &str, _allowed: &HashSet<String>) -> Result<Vec<Span>> {
        Ok(self.spans.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuardError;
    use crate::recognizer::pattern::PatternRecognizer;

    struct FailingRecognizer;

    #[async_trait]
    impl EntityRecognizer for FailingRecognizer {
        async fn analyze(&self, _text: &str, _allowed: &HashSet<String>) -> Result<Vec<Span>> {
            Err(GuardError::Recognizer("model unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn allow_all() -> HashSet<String> {
        ["PERSON", "THAI_ID"].iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_composite_concatenates_in_order() {
        let composite = CompositeRecognizer::new(vec![])
            .with(PatternRecognizer::with_defaults().unwrap())
            .with(StaticRecognizer::new(vec![Span::new("PERSON", 0, 7, 0.85)]));
        assert_eq!(composite.len(), 2);

        let spans = composite
            .analyze("Somchai 1234567890123", &allow_all())
            .await
            .unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].entity_type, "THAI_ID");
        assert_eq!(spans[1].entity_type, "PERSON");
    }

    #[tokio::test]
    async fn test_composite_fails_if_any_backend_fails() {
        let composite = CompositeRecognizer::new(vec![
            Box::new(StaticRecognizer::new(vec![Span::new("PERSON", 0, 3, 0.9)])),
            Box::new(FailingRecognizer),
        ]);
        let err = composite.analyze("Bob", &allow_all()).await.unwrap_err();
        assert!(matches!(err, GuardError::Recognizer(_)));
    }

    #[tokio::test]
    async fn test_empty_composite() {
        let composite = CompositeRecognizer::new(vec![]);
        assert!(composite.is_empty());
        assert!(composite.analyze("x", &allow_all()).await.unwrap().is_empty());
    }
}
