//! Domain entities. Pure data structures for scoring results and reports.
//!
//! No HTTP/CSV types here; adapters map to and from these.

use chrono::{DateTime, Utc};
use std::fmt;

/// Highest value score the rubric allows.
pub const MAX_SCORE: u8 = 10;

/// Value score in `0..=10`. Out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= MAX_SCORE)
            .map(Score)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed model verdict for one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: Score,
    pub reasoning: String,
}

/// Per-conversation result of the scoring pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    Scored(ScoreResult),
    Failed { reason: String },
}

impl ScoreOutcome {
    pub fn score(&self) -> Option<Score> {
        match self {
            ScoreOutcome::Scored(r) => Some(r.score),
            ScoreOutcome::Failed { .. } => None,
        }
    }

    /// Reasoning text for scored rows, `Error: …` text for failed ones.
    pub fn reasoning(&self) -> &str {
        match self {
            ScoreOutcome::Scored(r) => &r.reasoning,
            ScoreOutcome::Failed { reason } => reason,
        }
    }
}

/// One row of the ranked score table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    /// 1-based position after sorting by score.
    pub rank: usize,
    pub uuid: String,
    pub title: String,
    pub outcome: ScoreOutcome,
    pub created_at: DateTime<Utc>,
}

/// Score table sorted descending by score. Failed rows come last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    /// Sorts rows by score (descending, stable so ties keep their incoming order)
    /// and assigns contiguous 1-based ranks.
    pub fn ranked(mut rows: Vec<ScoreRow>) -> Self {
        rows.sort_by(|a, b| b.outcome.score().cmp(&a.outcome.score()));
        for (i, row) in rows.iter_mut().enumerate() {
            row.rank = i + 1;
        }
        Self { rows }
    }

    /// Wraps rows that are already ranked (e.g. read back from the cache).
    pub fn from_ranked_rows(rows: Vec<ScoreRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn failed_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.outcome.score().is_none())
            .count()
    }
}

/// Scored row plus its trailing rolling average, in creation-time order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub uuid: String,
    pub title: String,
    pub score: Score,
    pub created_at: DateTime<Utc>,
    /// `None` until the window has filled.
    pub rolling_average: Option<f64>,
}

/// Summary of what the loader read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub conversations: usize,
    pub dropped_empty: usize,
    pub messages: usize,
    pub words: usize,
    pub bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(uuid: &str, outcome: ScoreOutcome) -> ScoreRow {
        ScoreRow {
            rank: 0,
            uuid: uuid.to_string(),
            title: uuid.to_string(),
            outcome,
            created_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        }
    }

    fn scored(v: i64) -> ScoreOutcome {
        ScoreOutcome::Scored(ScoreResult {
            score: Score::new(v).unwrap(),
            reasoning: String::new(),
        })
    }

    #[test]
    fn test_score_bounds() {
        assert_eq!(Score::new(0).map(Score::value), Some(0));
        assert_eq!(Score::new(10).map(Score::value), Some(10));
        assert!(Score::new(11).is_none());
        assert!(Score::new(-1).is_none());
    }

    #[test]
    fn test_ranked_sorts_descending_and_failed_last() {
        let table = ScoreTable::ranked(vec![
            row("a", scored(3)),
            row(
                "b",
                ScoreOutcome::Failed {
                    reason: "Error: boom".to_string(),
                },
            ),
            row("c", scored(9)),
            row("d", scored(3)),
            row("e", scored(0)),
        ]);
        let order: Vec<_> = table.rows().iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(order, ["c", "a", "d", "e", "b"]);
        let ranks: Vec<_> = table.rows().iter().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4, 5]);
        assert_eq!(table.failed_count(), 1);
    }
}
