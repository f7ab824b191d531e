//! Span validation and overlap resolution
//!
//! Offsets are char (Unicode scalar value) indices into the source text.
//! The normalizer resolves them to byte ranges once, so later stages can
//! slice the text without re-walking it.

use crate::config::GuardConfig;
use crate::error::{GuardError, Result};
use crate::token::validate_entity_type;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// A candidate sensitive region reported by entity recognition
///
/// Offsets are unsigned, so negative offsets cannot be represented: spans
/// deserialized from JSON with a negative `start` or `end` fail with
/// `GuardError::Serialization` rather than `GuardError::MalformedSpan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Entity type label (e.g., "THAI_ID", "EMAIL_ADDRESS")
    pub entity_type: String,

    /// Start char offset (inclusive)
    pub start: usize,

    /// End char offset (exclusive)
    pub end: usize,

    /// Detection confidence in `[0, 1]`
    #[serde(alias = "score")]
    pub confidence: f64,
}

impl Span {
    /// Create a new span
    pub fn new(entity_type: impl Into<String>, start: usize, end: usize, confidence: f64) -> Self {
        Self {
            entity_type: entity_type.into(),
            start,
            end,
            confidence,
        }
    }

    /// Length in chars (zero for inverted spans)
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no text
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two spans share at least one char of `[start, end)`
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A span that survived overlap resolution
///
/// Carries the literal value captured from the source text before any
/// replacement happens. Only the normalizer can construct one.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedSpan {
    span: Span,
    value: String,
    byte_start: usize,
    byte_end: usize,
}

impl RetainedSpan {
    pub fn entity_type(&self) -> &str {
        &self.span.entity_type
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn confidence(&self) -> f64 {
        self.span.confidence
    }

    /// The original literal `text[start..end]`
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The span as reported by the recognizer
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub(crate) fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_start..self.byte_end
    }
}

/// Byte offset of every char boundary in `text`, plus `text.len()`
///
/// Index `i` holds the byte offset of char `i`; the last entry is the
/// byte length, so the vector has `char_count + 1` entries.
pub(crate) fn char_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    boundaries
}

/// Validates, filters and de-overlaps recognizer spans
///
/// Overlap policy: candidates are ordered by start ascending, then length
/// descending, then confidence descending, then entity type ascending. A
/// candidate is accepted only if it does not overlap an already accepted
/// span, so longer and more confident detections win over nested ones.
#[derive(Debug, Clone)]
pub struct SpanNormalizer {
    allowed: HashSet<String>,
    min_confidence: f64,
}

impl SpanNormalizer {
    /// Create a normalizer for an entity-type allow-list
    pub fn new<I, S>(allowed: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed
            .into_iter()
            .map(|s| {
                let s = s.into();
                validate_entity_type(&s)?;
                Ok(s)
            })
            .collect::<Result<HashSet<String>>>()?;

        Ok(Self {
            allowed,
            min_confidence: 0.0,
        })
    }

    /// Create a normalizer from guard configuration
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        Ok(Self::new(config.entities.iter().cloned())?.with_min_confidence(config.min_confidence))
    }

    /// Drop spans scoring below this confidence
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// The entity-type allow-list
    pub fn allowed(&self) -> &HashSet<String> {
        &self.allowed
    }

    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Whether a span passes the allow-list and confidence filter
    pub fn accepts(&self, span: &Span) -> bool {
        self.allowed.contains(&span.entity_type) && span.confidence >= self.min_confidence
    }

    /// Resolve raw spans into non-overlapping retained spans, ordered by start
    ///
    /// Spans outside the allow-list or below the confidence floor are
    /// dropped silently. Any remaining span with inverted or out-of-range
    /// bounds fails the whole call.
    pub fn normalize(&self, text: &str, spans: &[Span]) -> Result<Vec<RetainedSpan>> {
        let boundaries = char_boundaries(text);
        let text_len = boundaries.len() - 1;

        let mut candidates = Vec::with_capacity(spans.len());
        for span in spans.iter().filter(|s| self.accepts(s)) {
            check_bounds(span, text_len)?;
            candidates.push(span);
        }

        candidates.sort_by(|a, b| compare_candidates(a, b));

        let mut retained: Vec<RetainedSpan> = Vec::with_capacity(candidates.len());
        let mut covered_until = 0usize;
        for span in candidates {
            // Every accepted span starts at or before this one, so it
            // overlaps one of them exactly when it starts before the
            // furthest accepted end.
            if span.start < covered_until {
                continue;
            }
            let byte_start = boundaries[span.start];
            let byte_end = boundaries[span.end];
            retained.push(RetainedSpan {
                span: span.clone(),
                value: text[byte_start..byte_end].to_string(),
                byte_start,
                byte_end,
            });
            covered_until = covered_until.max(span.end);
        }

        tracing::debug!(
            received = spans.len(),
            retained = retained.len(),
            "Spans normalized"
        );

        Ok(retained)
    }
}

fn check_bounds(span: &Span, text_len: usize) -> Result<()> {
    let reason = if span.start >= span.end {
        "start must be before end"
    } else if span.end > text_len {
        "end beyond text length"
    } else {
        return Ok(());
    };

    Err(GuardError::MalformedSpan {
        entity_type: span.entity_type.clone(),
        start: span.start,
        end: span.end,
        text_len,
        reason: reason.to_string(),
    })
}

fn compare_candidates(a: &Span, b: &Span) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.entity_type.cmp(&b.entity_type))
}
