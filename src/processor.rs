//! Downstream processor — the untrusted third party
//!
//! Receives masked text and returns transformed text that may contain some,
//! all, or none of the placeholders, verbatim or repeated.

use crate::error::Result;
use async_trait::async_trait;

/// Core trait for downstream processors (hosted language models, etc.)
///
/// Implementations report failures as `GuardError::Downstream`. The guard
/// performs no retries.
#[async_trait]
pub trait DownstreamProcessor: Send + Sync {
    /// Process masked text and return the third party's output
    async fn process(&self, masked_text: &str) -> Result<String>;

    /// Processor name (for logs)
    fn name(&self) -> &str;
}

/// Identity processor for tests and dry runs
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProcessor;

#[async_trait]
impl DownstreamProcessor for EchoProcessor {
    async fn process(&self, masked_text: &str) -> Result<String> {
        Ok(masked_text.to_string())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_input() {
        let out = EchoProcessor.process("Hi <PERSON_1>").await.unwrap();
        assert_eq!(out, "Hi <PERSON_1>");
        assert_eq!(EchoProcessor.name(), "echo");
    }
}
