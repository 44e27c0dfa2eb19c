//! Mock AI adapter for running the pipeline without API calls.
//!
//! Returns a deterministic score derived from the prompt, so repeated runs agree.

use crate::domain::{DomainError, MAX_SCORE};
use crate::ports::{CompletionPort, CompletionRequest};
use std::time::Duration;
use tracing::info;

/// Model name reported by the mock adapter.
pub const MOCK_MODEL: &str = "mock";

/// Mock completion adapter.
///
/// Returns `{"score", "reasoning"}` JSON without making API calls.
/// Simulates network latency with configurable delay.
pub struct MockAiAdapter {
    /// Simulated network delay in milliseconds.
    delay_ms: u64,
}

impl MockAiAdapter {
    /// Create a new mock adapter with default delay (100ms).
    pub fn new() -> Self {
        Self { delay_ms: 100 }
    }

    /// Create a mock adapter with custom delay.
    pub fn with_delay(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    fn score_for(prompt: &str) -> u8 {
        let sum = prompt
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)));
        (sum % (u32::from(MAX_SCORE) + 1)) as u8
    }
}

impl Default for MockAiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CompletionPort for MockAiAdapter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        info!(
            prompt_len = request.user.len(),
            "[MOCK] Simulating AI scoring"
        );

        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        let score = Self::score_for(&request.user);
        let body = serde_json::json!({
            "score": score,
            "reasoning": format!(
                "[MOCK] Simulated score for a {} character prompt. Configure an API key for real scoring.",
                request.user.chars().count()
            ),
        });
        Ok(body.to_string())
    }

    fn model(&self) -> &str {
        MOCK_MODEL
    }
}
