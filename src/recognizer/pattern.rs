//! Regex-based entity recognizer
//!
//! Compiles a list of `PatternRule`s once and reports every match of an
//! allowed entity type as a `Span` with char offsets.

use crate::error::{GuardError, Result};
use crate::recognizer::EntityRecognizer;
use crate::span::{char_boundaries, Span};
use crate::token::validate_entity_type;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named regex that detects one entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternRule {
    /// Rule name (for logs)
    pub name: String,

    /// Entity type reported for matches
    pub entity_type: String,

    /// Regular expression (Rust `regex` syntax)
    pub pattern: String,

    /// Confidence assigned to every match
    pub score: f64,
}

impl PatternRule {
    pub fn new(
        name: impl Into<String>,
        entity_type: impl Into<String>,
        pattern: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            name: name.into(),
            entity_type: entity_type.into(),
            pattern: pattern.into(),
            score,
        }
    }
}

/// Default pattern rules
///
/// Named-entity types such as `PERSON` need a statistical model and are
/// not covered here; plug in another recognizer for them.
pub fn default_pattern_rules() -> Vec<PatternRule> {
    vec![
        PatternRule::new("thai_id", "THAI_ID", r"\b\d{13}\b", 0.9),
        PatternRule::new(
            "btc_wallet",
            "CRYPTO_WALLET",
            r"\b[13][a-km-zA-HJ-NP-Z1-9]{25,34}\b",
            0.8,
        ),
        PatternRule::new("eth_wallet", "CRYPTO_WALLET", r"\b0x[a-fA-F0-9]{40}\b", 0.8),
        PatternRule::new(
            "email",
            "EMAIL_ADDRESS",
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            0.9,
        ),
        PatternRule::new(
            "credit_card",
            "CREDIT_CARD",
            r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b",
            0.85,
        ),
        PatternRule::new(
            "phone",
            "PHONE_NUMBER",
            r"\b\d{3}[-.\s]?\d{3}[-.\s]?\d{4}\b",
            0.7,
        ),
    ]
}

struct CompiledRule {
    name: String,
    entity_type: String,
    regex: Regex,
    score: f64,
}

/// Regex recognizer
pub struct PatternRecognizer {
    rules: Vec<CompiledRule>,
}

impl PatternRecognizer {
    /// Compile pattern rules
    pub fn new(rules: &[PatternRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                validate_entity_type(&rule.entity_type)?;
                if !(0.0..=1.0).contains(&rule.score) {
                    return Err(GuardError::InvalidPattern(format!(
                        "{}: score must be within [0, 1], got {}",
                        rule.name, rule.score
                    )));
                }
                let regex = Regex::new(&rule.pattern).map_err(|e| {
                    GuardError::InvalidPattern(format!("{}: {}", rule.name, e))
                })?;
                Ok(CompiledRule {
                    name: rule.name.clone(),
                    entity_type: rule.entity_type.clone(),
                    regex,
                    score: rule.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Recognizer with `default_pattern_rules()`
    pub fn with_defaults() -> Result<Self> {
        Self::new(&default_pattern_rules())
    }

    /// Number of compiled rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Synchronous matching, shared by the async trait impl
    pub fn find_spans(&self, text: &str, allowed: &HashSet<String>) -> Vec<Span> {
        let boundaries = char_boundaries(text);
        let to_char = |byte: usize| boundaries.binary_search(&byte).unwrap_or_else(|i| i);

        let mut spans = Vec::new();
        for rule in self.rules.iter().filter(|r| allowed.contains(&r.entity_type)) {
            let before = spans.len();
            // Empty matches (e.g. `\d{0,13}` before a letter) cover no text
            spans.extend(rule.regex.find_iter(text).filter(|m| m.start() < m.end()).map(|m| {
                Span::new(
                    rule.entity_type.clone(),
                    to_char(m.start()),
                    to_char(m.end()),
                    rule.score,
                )
            }));
            if spans.len() > before {
                tracing::trace!(rule = %rule.name, matches = spans.len() - before, "Pattern matched");
            }
        }
        spans
    }
}

#[async_trait]
impl EntityRecognizer for PatternRecognizer {
    async fn analyze(&self, text: &str, allowed: &HashSet<String>) -> Result<Vec<Span>> {
        Ok(self.find_spans(text, allowed))
    }

    fn name(&self) -> &str {
        "pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow(types: &[&str]) -> HashSet<String> {
        types.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_thai_id_detected() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let spans = recognizer.find_spans("My ID is 1234567890123", &allow(&["THAI_ID"]));
        assert_eq!(spans, vec![Span::new("THAI_ID", 9, 22, 0.9)]);
    }

    #[test]
    fn test_thai_id_needs_exactly_13_digits() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let allowed = allow(&["THAI_ID"]);
        assert!(recognizer.find_spans("123456789012", &allowed).is_empty());
        assert!(recognizer.find_spans("12345678901234", &allowed).is_empty());
    }

    #[test]
    fn test_offsets_are_chars_not_bytes() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let text = "เลขบัตร 1234567890123";
        let spans = recognizer.find_spans(text, &allow(&["THAI_ID"]));
        assert_eq!(spans.len(), 1);
        let value: String = text
            .chars()
            .skip(spans[0].start)
            .take(spans[0].len())
            .collect();
        assert_eq!(value, "1234567890123");
    }

    #[test]
    fn test_crypto_wallets() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let text = "send to 0x52908400098527886E0F7030069857D2E4169EE7 or 1BoatSLRHtKNngkdXEeobR76b53LETtpyT";
        let spans = recognizer.find_spans(text, &allow(&["CRYPTO_WALLET"]));
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|s| s.entity_type == "CRYPTO_WALLET"));
    }

    #[test]
    fn test_email_and_phone() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let text = "mail somchai@example.co.th or call 081-234-5678";
        let spans = recognizer.find_spans(text, &allow(&["EMAIL_ADDRESS", "PHONE_NUMBER"]));
        let types: Vec<&str> = spans.iter().map(|s| s.entity_type.as_str()).collect();
        assert_eq!(types, vec!["EMAIL_ADDRESS", "PHONE_NUMBER"]);
        assert_eq!(spans[0].start, 5);
        assert_eq!(spans[0].end, 5 + "somchai@example.co.th".len());
    }

    #[test]
    fn test_rules_outside_allow_list_skipped() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let spans = recognizer.find_spans("a@b.co 1234567890123", &allow(&["EMAIL_ADDRESS"]));
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].entity_type, "EMAIL_ADDRESS");
    }

    #[test]
    fn test_invalid_pattern() {
        let result = PatternRecognizer::new(&[PatternRule::new("bad", "X", "[", 0.5)]);
        assert!(matches!(result, Err(GuardError::InvalidPattern(msg)) if msg.starts_with("bad")));
    }

    #[test]
    fn test_empty_matches_skipped() {
        let recognizer =
            PatternRecognizer::new(&[PatternRule::new("opt_id", "THAI_ID", r"\d{0,13}", 0.9)])
                .unwrap();
        let allowed = allow(&["THAI_ID"]);
        assert!(recognizer.find_spans("hello there", &allowed).is_empty());

        let spans = recognizer.find_spans("ID 1234567890123", &allowed);
        assert_eq!(spans, vec![Span::new("THAI_ID", 3, 16, 0.9)]);
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        for score in [f64::NAN, -0.1, 1.5] {
            let result = PatternRecognizer::new(&[PatternRule::new("id", "THAI_ID", r"\d", score)]);
            assert!(matches!(result, Err(GuardError::InvalidPattern(msg)) if msg.contains("score")));
        }
    }

    #[test]
    fn test_invalid_entity_type() {
        let result = PatternRecognizer::new(&[PatternRule::new("bad", "<X>", r"\d", 0.5)]);
        assert!(matches!(result, Err(GuardError::InvalidEntityType(_))));
    }

    #[tokio::test]
    async fn test_async_analyze() {
        let recognizer = PatternRecognizer::with_defaults().unwrap();
        let spans = recognizer
            .analyze("ID 1234567890123", &allow(&["THAI_ID"]))
            .await
            .unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(recognizer.name(), "pattern");
    }
}
