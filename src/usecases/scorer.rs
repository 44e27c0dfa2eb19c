//! Scores one conversation: render prompt, call the model, parse the verdict.

use crate::adapters::ai::parse_score_response;
use crate::adapters::ai::prompt::{SYSTEM_PROMPT, user_prompt};
use crate::domain::{Conversation, DomainError, ScoreResult};
use crate::ports::{CompletionPort, CompletionRequest};
use crate::shared::config::ScoringConfig;
use std::sync::Arc;
use tracing::debug;

/// Value scorer. Holds the completion port and the immutable scoring config.
pub struct Scorer {
    completion: Arc<dyn CompletionPort>,
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(completion: Arc<dyn CompletionPort>, config: ScoringConfig) -> Self {
        Self { completion, config }
    }

    pub fn model(&self) -> &str {
        self.completion.model()
    }

    /// One completion call, then the fixed delay (also after a failed call).
    /// No retry: errors go straight back to the caller.
    pub async fn score(&self, conversation: &Conversation) -> Result<ScoreResult, DomainError> {
        let request = CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: user_prompt(
                self.config.prompt_template(),
                conversation,
                self.config.max_prompt_chars(),
            ),
            json_output: true,
        };
        debug!(
            uuid = %conversation.uuid,
            prompt_len = request.user.len(),
            "requesting score"
        );

        let response = self.completion.complete(&request).await;
        tokio::time::sleep(self.config.call_delay()).await;

        parse_score_response(&response?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Completion port answering from a script keyed on a marker in the prompt.
    pub struct ScriptedCompletion {
        /// (substring of the user prompt, raw reply or error text)
        pub replies: Vec<(String, Result<String, String>)>,
        pub calls: AtomicUsize,
        pub requests: Mutex<VecDeque<CompletionRequest>>,
    }

    impl ScriptedCompletion {
        pub fn new(replies: Vec<(&str, Result<&str, &str>)>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.map(str::to_string).map_err(str::to_string)))
                    .collect(),
                calls: AtomicUsize::new(0),
                requests: Mutex::new(VecDeque::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl CompletionPort for ScriptedCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .expect("requests lock")
                .push_back(request.clone());
            self.replies
                .iter()
                .find(|(marker, _)| request.user.contains(marker.as_str()))
                .map(|(_, reply)| reply.clone().map_err(DomainError::Scoring))
                .unwrap_or_else(|| Err(DomainError::Scoring("no scripted reply".to_string())))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    pub fn fast_config() -> ScoringConfig {
        ScoringConfig::new(
            "Rate:\n{messages}".to_string(),
            std::time::Duration::from_millis(1),
            10_000,
        )
        .expect("valid template")
    }
}
