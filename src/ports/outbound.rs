//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Conversation, DomainError, ExportStats, ReportRow, ScoreTable};
use std::path::PathBuf;
use std::time::SystemTime;

/// Source of parsed conversations (the export file).
#[async_trait::async_trait]
pub trait ConversationSource: Send + Sync {
    /// Load every non-empty conversation, sorted ascending by `created_at`.
    /// All-or-nothing: a single malformed record fails the whole load.
    async fn load(&self) -> Result<(Vec<Conversation>, ExportStats), DomainError>;

    /// Modification time of the underlying export, if known.
    async fn last_modified(&self) -> Result<Option<SystemTime>, DomainError>;
}

/// One completion call: a system + user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider for a JSON-object response.
    pub json_output: bool,
}

/// Language-model completion endpoint.
#[async_trait::async_trait]
pub trait CompletionPort: Send + Sync {
    /// Returns the raw text content of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;

    /// Model identifier, for logs and prompts.
    fn model(&self) -> &str;
}

/// Score table cache. Presence short-circuits re-scoring.
#[async_trait::async_trait]
pub trait ScoreCachePort: Send + Sync {
    /// Returns `None` when no cache exists yet.
    async fn load(&self) -> Result<Option<ScoreTable>, DomainError>;

    async fn save(&self, table: &ScoreTable) -> Result<(), DomainError>;

    /// Modification time of the cache, `None` when it does not exist.
    async fn last_modified(&self) -> Result<Option<SystemTime>, DomainError>;
}

/// Renders the rolling-average time series.
pub trait ChartPort: Send + Sync {
    /// Draw `rows` (creation-time order) and return the written image path.
    fn render_rolling_average(
        &self,
        rows: &[ReportRow],
        window: usize,
    ) -> Result<PathBuf, DomainError>;
}

/// Destination for extracted transcripts.
#[async_trait::async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Write one transcript under `file_stem` and return its path.
    async fn write_transcript(&self, file_stem: &str, contents: &str)
    -> Result<PathBuf, DomainError>;
}
