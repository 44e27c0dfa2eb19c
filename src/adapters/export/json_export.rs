//! Implements ConversationSource over the `conversations.json` export.
//!
//! The whole file is one JSON array. Loading is all-or-nothing: a garbled record
//! aborts the load instead of producing a silently truncated report.

use crate::domain::{Conversation, DomainError, ExportStats};
use crate::ports::ConversationSource;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::info;

/// Export file on local disk.
pub struct ExportFileSource {
    path: PathBuf,
}

impl ExportFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn parse(raw: &str) -> Result<Vec<Conversation>, DomainError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| DomainError::Load(format!("malformed export JSON: {}", e)))?;
        let records = value
            .as_array()
            .ok_or_else(|| DomainError::Load("export top level is not a JSON array".to_string()))?;
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Conversation::from_json(record)
                    .map_err(|source| DomainError::Construction { index, source })
            })
            .collect()
    }
}

/// Drops conversations without messages and sorts the rest ascending by
/// `created_at`. The sort is stable, so equal timestamps keep export order.
pub fn normalize_conversations(
    conversations: Vec<Conversation>,
) -> (Vec<Conversation>, ExportStats) {
    let total = conversations.len();
    let mut kept: Vec<Conversation> = conversations
        .into_iter()
        .filter(|c| !c.messages.is_empty())
        .collect();
    kept.sort_by_key(|c| c.created_at);

    let stats = ExportStats {
        conversations: kept.len(),
        dropped_empty: total - kept.len(),
        messages: kept.iter().map(|c| c.messages.len()).sum(),
        words: kept.iter().map(Conversation::word_count).sum(),
        bytes: kept.iter().map(Conversation::byte_count).sum(),
    };
    (kept, stats)
}

#[async_trait::async_trait]
impl ConversationSource for ExportFileSource {
    async fn load(&self) -> Result<(Vec<Conversation>, ExportStats), DomainError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DomainError::Load(format!(
                    "export file not found: {}",
                    self.path.display()
                )));
            }
            Err(e) => {
                return Err(DomainError::Load(format!(
                    "read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let (conversations, stats) = normalize_conversations(Self::parse(&raw)?);
        info!(
            path = %self.path.display(),
            conversations = stats.conversations,
            dropped_empty = stats.dropped_empty,
            messages = stats.messages,
            words = stats.words,
            bytes = stats.bytes,
            "loaded export"
        );
        Ok((conversations, stats))
    }

    async fn last_modified(&self) -> Result<Option<SystemTime>, DomainError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|e| DomainError::Load(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::Load(e.to_string())),
        }
    }
}
