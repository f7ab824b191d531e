//! Masking and unmasking
//!
//! `mask` rewrites the source text right to left, replacing every retained
//! span with a freshly allocated placeholder. Working from the highest
//! offset down keeps the offsets of all not-yet-replaced spans valid in the
//! original text, so no shift bookkeeping is needed. Placeholder numbers are
//! assigned in that same right-to-left order: in `"Alice met Bob"` the name
//! `Bob` becomes `<PERSON_1>` and `Alice` becomes `<PERSON_2>`.
//!
//! `unmask` restores every placeholder occurrence in a single left-to-right
//! scan, preferring the longest token at each position. Restored values are
//! never rescanned, so the result does not depend on mapping order.
//!
//! Limitation: text that already contains a placeholder literal the masking
//! call also allocates does not round-trip. In `"<THAI_ID_1> 1234567890123"`
//! the pre-existing `<THAI_ID_1>` is restored to `1234567890123` as well.
//! No runtime check guards against this; the `<`/`>` delimiters make such
//! literals unlikely in natural text.

use crate::config::GuardConfig;
use crate::error::{GuardError, Result};
use crate::mapping::Mapping;
use crate::span::{RetainedSpan, Span, SpanNormalizer};
use crate::token::TokenAllocator;
use serde::{Deserialize, Serialize};

/// Sanitized text plus the mapping needed to reverse it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskResult {
    /// Text with every retained span replaced by its placeholder
    pub safe_text: String,

    /// Placeholder → original value, in masking (right-to-left) order
    pub mapping: Mapping,
}

impl MaskResult {
    /// Whether anything was redacted
    pub fn is_masked(&self) -> bool {
        !self.mapping.is_empty()
    }
}

/// Replace retained spans in `text` with placeholders
///
/// `spans` must come from normalizing this same `text`. A span whose
/// captured value no longer matches the text, or two spans that overlap,
/// fail the call before anything is produced.
pub fn mask(text: &str, spans: &[RetainedSpan]) -> Result<MaskResult> {
    let mut ordered: Vec<&RetainedSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| b.start().cmp(&a.start()));

    let mut safe_text = text.to_string();
    let mut mapping = Mapping::new();
    let mut allocator = TokenAllocator::new();
    let mut next_start = usize::MAX;

    for span in ordered {
        if span.end() > next_start {
            return Err(mismatch(span, text, "overlaps another retained span"));
        }
        let range = span.byte_range();
        if text.get(range.clone()) != Some(span.value()) {
            return Err(mismatch(span, text, "captured value does not match text"));
        }

        let token = allocator.allocate(span.entity_type());
        safe_text.replace_range(range, &token);
        mapping.insert(token, span.value());
        next_start = span.start();
    }

    tracing::debug!(
        masked = mapping.len(),
        input_len = text.len(),
        output_len = safe_text.len(),
        "Text masked"
    );

    Ok(MaskResult { safe_text, mapping })
}

fn mismatch(span: &RetainedSpan, text: &str, reason: &str) -> GuardError {
    GuardError::MalformedSpan {
        entity_type: span.entity_type().to_string(),
        start: span.start(),
        end: span.end(),
        text_len: text.chars().count(),
        reason: reason.to_string(),
    }
}

/// Replace every occurrence of every mapped token with its original value
///
/// Tokens absent from `text` are skipped; token-shaped text without a
/// mapping entry is left untouched.
pub fn unmask(text: &str, mapping: &Mapping) -> String {
    let mut tokens: Vec<(&str, &str)> = mapping.iter().filter(|(t, _)| !t.is_empty()).collect();
    if tokens.is_empty() {
        return text.to_string();
    }
    tokens.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut leads: Vec<char> = tokens.iter().filter_map(|(t, _)| t.chars().next()).collect();
    leads.sort_unstable();
    leads.dedup();

    let mut restored = String::with_capacity(text.len());
    let mut replaced = 0usize;
    let mut rest = text;

    while let Some(pos) = rest.find(|c: char| leads.binary_search(&c).is_ok()) {
        restored.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some((token, value)) = tokens.iter().find(|(t, _)| rest.starts_with(t)) {
            restored.push_str(value);
            rest = &rest[token.len()..];
            replaced += 1;
        } else if let Some(ch) = rest.chars().next() {
            restored.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    restored.push_str(rest);

    tracing::debug!(tokens = mapping.len(), replaced, "Text unmasked");

    restored
}

/// Stateless masking engine
///
/// Holds only immutable configuration. Every `mask` call allocates its own
/// counters and mapping, so one engine can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct MaskingEngine {
    normalizer: SpanNormalizer,
}

impl MaskingEngine {
    pub fn new(normalizer: SpanNormalizer) -> Self {
        Self { normalizer }
    }

    /// Create an engine from guard configuration
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        Ok(Self::new(SpanNormalizer::from_config(config)?))
    }

    pub fn normalizer(&self) -> &SpanNormalizer {
        &self.normalizer
    }

    /// Normalize raw recognizer spans and mask the text
    pub fn mask(&self, text: &str, spans: &[Span]) -> Result<MaskResult> {
        let retained = self.normalizer.normalize(text, spans)?;
        mask(text, &retained)
    }

    /// Restore placeholders in `text` from a mapping
    pub fn unmask(&self, text: &str, mapping: &Mapping) -> String {
        unmask(text, mapping)
    }
}
