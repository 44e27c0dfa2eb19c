//! Implements TranscriptSink. One `.txt` file per exported conversation.

use crate::domain::DomainError;
use crate::ports::TranscriptSink;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Writes transcripts into a directory, creating it on first use.
pub struct FsTranscriptSink {
    base_dir: PathBuf,
}

impl FsTranscriptSink {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl TranscriptSink for FsTranscriptSink {
    async fn write_transcript(
        &self,
        file_stem: &str,
        contents: &str,
    ) -> Result<PathBuf, DomainError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| DomainError::FileSystem(format!("create transcript dir: {}", e)))?;
        let path = self.base_dir.join(format!("{}.txt", file_stem));
        fs::write(&path, contents)
            .await
            .map_err(|e| DomainError::FileSystem(format!("write {}: {}", path.display(), e)))?;
        info!(path = %path.display(), bytes = contents.len(), "transcript written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_creates_directory_and_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsTranscriptSink::new(dir.path().join("conversations"));

        let path = sink.write_transcript("Trip Planning", "body").await.unwrap();

        assert_eq!(path, dir.path().join("conversations").join("Trip Planning.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "body");
    }
}
