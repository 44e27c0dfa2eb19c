//! Implements ScoreCachePort using a CSV file.
//!
//! Columns: `Rank, Uuid, Title, Value Score, Reasoning, Created At`. A failed row
//! has an empty `Value Score`. Rows are read back verbatim, in file order.

use crate::domain::{DomainError, Score, ScoreOutcome, ScoreResult, ScoreRow, ScoreTable};
use crate::ports::ScoreCachePort;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

/// One CSV line.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    #[serde(rename = "Rank")]
    rank: usize,
    #[serde(rename = "Uuid")]
    uuid: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Value Score")]
    value_score: Option<u8>,
    #[serde(rename = "Reasoning")]
    reasoning: String,
    #[serde(rename = "Created At")]
    created_at: DateTime<Utc>,
}

impl From<&ScoreRow> for CacheRecord {
    fn from(row: &ScoreRow) -> Self {
        Self {
            rank: row.rank,
            uuid: row.uuid.clone(),
            title: row.title.clone(),
            value_score: row.outcome.score().map(Score::value),
            reasoning: row.outcome.reasoning().to_string(),
            created_at: row.created_at,
        }
    }
}

impl TryFrom<CacheRecord> for ScoreRow {
    type Error = DomainError;

    fn try_from(rec: CacheRecord) -> Result<Self, Self::Error> {
        let outcome = match rec.value_score {
            Some(v) => ScoreOutcome::Scored(ScoreResult {
                score: Score::new(i64::from(v)).ok_or_else(|| {
                    DomainError::Cache(format!("row {}: score {} out of range", rec.rank, v))
                })?,
                reasoning: rec.reasoning,
            }),
            None => ScoreOutcome::Failed {
                reason: rec.reasoning,
            },
        };
        Ok(ScoreRow {
            rank: rec.rank,
            uuid: rec.uuid,
            title: rec.title,
            outcome,
            created_at: rec.created_at,
        })
    }
}

/// CSV file-based score cache.
pub struct CsvScoreCache {
    path: PathBuf,
}

impl CsvScoreCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(table: &ScoreTable) -> Result<Vec<u8>, DomainError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        for row in table.rows() {
            wtr.serialize(CacheRecord::from(row))
                .map_err(|e| DomainError::Cache(e.to_string()))?;
        }
        wtr.into_inner()
            .map_err(|e| DomainError::Cache(e.to_string()))
    }

    fn decode(raw: &[u8]) -> Result<ScoreTable, DomainError> {
        let mut rdr = csv::Reader::from_reader(raw);
        let rows = rdr
            .deserialize::<CacheRecord>()
            .map(|rec| {
                rec.map_err(|e| DomainError::Cache(e.to_string()))
                    .and_then(ScoreRow::try_from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScoreTable::from_ranked_rows(rows))
    }
}

#[async_trait::async_trait]
impl ScoreCachePort for CsvScoreCache {
    async fn load(&self) -> Result<Option<ScoreTable>, DomainError> {
        let raw = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::Cache(format!("read cache: {}", e))),
        };
        let table = Self::decode(&raw)?;
        info!(path = %self.path.display(), rows = table.len(), "loaded score cache");
        Ok(Some(table))
    }

    /// Atomic save using write-replace: temp file, sync_all, rename.
    async fn save(&self, table: &ScoreTable) -> Result<(), DomainError> {
        let bytes = Self::encode(table)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::FileSystem(format!("create output dir: {}", e)))?;
        }

        let temp_path = self.path.with_extension("csv.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::FileSystem(format!("create temp file: {}", e)))?;
        f.write_all(&bytes)
            .await
            .map_err(|e| DomainError::FileSystem(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::FileSystem(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::FileSystem(format!("atomic rename failed: {}", e)))?;

        info!(path = %self.path.display(), rows = table.len(), "saved score cache");
        Ok(())
    }

    async fn last_modified(&self) -> Result<Option<SystemTime>, DomainError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|e| DomainError::Cache(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DomainError::Cache(e.to_string())),
        }
    }
}
