//! # a3s-prompt-guard
//!
//! Reversible redaction for text sent to untrusted third parties.
//!
//! ## Overview
//!
//! `a3s-prompt-guard` replaces detected sensitive spans with placeholders
//! such as `<THAI_ID_1>` before text leaves your boundary, and restores the
//! original values in whatever comes back, even when the third party only
//! ever saw the placeholders.
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_prompt_guard::{GuardConfig, GuardRequest, PromptGuard, EchoProcessor};
//!
//! # async fn example() -> a3s_prompt_guard::Result<()> {
//! let guard = PromptGuard::with_patterns(GuardConfig::default(), EchoProcessor)?;
//!
//! let response = guard.handle(&GuardRequest::new("My ID is 1234567890123")).await?;
//! assert_eq!(response.masked_prompt, "My ID is <THAI_ID_1>");
//! assert_eq!(response.final_response, "My ID is 1234567890123");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **SpanNormalizer** — validates recognizer spans, resolves overlaps
//! - **TokenAllocator** — per-call, per-type placeholder numbering
//! - **mask / unmask** — right-to-left splicing, single-pass restoration
//! - **EntityRecognizer** trait — pluggable detection backends
//! - **DownstreamProcessor** trait — the untrusted third party
//! - **PromptGuard** — one protected exchange end to end
//! - **MappingSealer** — encrypt a mapping for carriage through untrusted hands
//!
//! The engine is stateless across calls: everything needed to restore a
//! text travels in the `Mapping` returned by `mask`.

pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod mapping;
pub mod processor;
pub mod recognizer;
pub mod seal;
pub mod span;
pub mod token;
pub mod types;

// Re-export core types
pub use config::{GuardConfig, DEFAULT_ENTITIES};
pub use engine::{mask, unmask, MaskResult, MaskingEngine};
pub use error::{GuardError, Result};
pub use gateway::PromptGuard;
pub use mapping::Mapping;
pub use processor::{DownstreamProcessor, EchoProcessor};
pub use recognizer::{CompositeRecognizer, EntityRecognizer, StaticRecognizer};
pub use seal::{Aes256GcmSealer, MappingSealer, SealedMapping};
pub use span::{RetainedSpan, Span, SpanNormalizer};
pub use token::TokenAllocator;
pub use types::{GuardRequest, GuardResponse};

// Re-export the bundled recognizer for convenience
pub use recognizer::pattern::{default_pattern_rules, PatternRecognizer, PatternRule};
