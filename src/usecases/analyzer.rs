//! Parallel analyzer. Scores every conversation through a bounded worker pool,
//! or reuses the cached table when the cache policy allows it.
//!
//! Failures are isolated per conversation: a failed call becomes a
//! `ScoreOutcome::Failed` row and never cancels its siblings.

use crate::adapters::ai::MOCK_MODEL;
use crate::adapters::ui::progress::{hidden_bar, scoring_bar};
use crate::domain::{Conversation, DomainError, ScoreOutcome, ScoreRow, ScoreTable};
use crate::ports::{ConversationSource, InputPort, ScoreCachePort};
use crate::shared::config::CachePolicy;
use crate::usecases::Scorer;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Orchestrates cache lookup, operator confirmation and the scoring pass.
pub struct AnalyzerService {
    scorer: Arc<Scorer>,
    cache: Arc<dyn ScoreCachePort>,
    source: Arc<dyn ConversationSource>,
    input: Arc<dyn InputPort>,
    policy: CachePolicy,
    max_workers: usize,
    show_progress: bool,
}

impl AnalyzerService {
    pub fn new(
        scorer: Arc<Scorer>,
        cache: Arc<dyn ScoreCachePort>,
        source: Arc<dyn ConversationSource>,
        input: Arc<dyn InputPort>,
        policy: CachePolicy,
        max_workers: usize,
    ) -> Self {
        Self {
            scorer,
            cache,
            source,
            input,
            policy,
            max_workers: max_workers.max(1),
            show_progress: false,
        }
    }

    /// Draw an indicatif bar during the scoring pass.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Returns one row per conversation, ranked by score.
    pub async fn analyze(&self, conversations: &[Conversation]) -> Result<ScoreTable, DomainError> {
        if let Some(table) = self.cached_table().await? {
            info!(rows = table.len(), "using cached scores; no API calls made");
            return Ok(table);
        }

        if !conversations.is_empty()
            && !self
                .input
                .confirm_scoring(conversations.len(), self.scorer.model())
                .await?
        {
            return Err(DomainError::Input("scoring cancelled by operator".to_string()));
        }

        let rows = self.score_all(conversations).await;
        let table = ScoreTable::ranked(rows);
        info!(
            rows = table.len(),
            failed = table.failed_count(),
            "scoring pass complete"
        );
        // mock scores must never satisfy a later real run
        if self.scorer.model() == MOCK_MODEL {
            warn!("mock scores are not written to the cache");
        } else {
            self.cache.save(&table).await?;
        }
        Ok(table)
    }

    async fn cached_table(&self) -> Result<Option<ScoreTable>, DomainError> {
        match self.policy {
            CachePolicy::Refresh => {
                info!("cache policy is refresh; re-scoring");
                Ok(None)
            }
            CachePolicy::Reuse => self.cache.load().await,
            CachePolicy::ReuseIfFresh => {
                let cache_time = self.cache.last_modified().await?;
                let export_time = self.source.last_modified().await?;
                match (cache_time, export_time) {
                    (None, _) => Ok(None),
                    (Some(cached), Some(exported)) if cached < exported => {
                        warn!("score cache is older than the export; re-scoring");
                        Ok(None)
                    }
                    _ => self.cache.load().await,
                }
            }
        }
    }

    /// Runs the scorer over all conversations with at most `max_workers` calls
    /// in flight. Rows come back in input order.
    async fn score_all(&self, conversations: &[Conversation]) -> Vec<ScoreRow> {
        let total = conversations.len();
        let workers = self.max_workers.min(total).max(1);
        info!(total, workers, model = %self.scorer.model(), "scoring conversations");

        let bar = if self.show_progress {
            scoring_bar(total)
        } else {
            hidden_bar()
        };
        let semaphore = Arc::new(Semaphore::new(workers));

        let handles: Vec<_> = conversations
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, conversation)| {
                let sem = Arc::clone(&semaphore);
                let scorer = Arc::clone(&self.scorer);
                let bar = bar.clone();
                tokio::spawn(async move {
                    let outcome = match sem.acquire().await {
                        Ok(_permit) => match scorer.score(&conversation).await {
                            Ok(result) => {
                                info!(
                                    index,
                                    title = %conversation.name,
                                    score = %result.score,
                                    "scored conversation"
                                );
                                ScoreOutcome::Scored(result)
                            }
                            Err(e) => {
                                warn!(index, title = %conversation.name, error = %e, "scoring failed");
                                ScoreOutcome::Failed {
                                    reason: format!("Error: {}", e),
                                }
                            }
                        },
                        Err(e) => ScoreOutcome::Failed {
                            reason: format!("Error: worker pool closed: {}", e),
                        },
                    };
                    bar.set_message(conversation.name.clone());
                    bar.inc(1);
                    outcome
                })
            })
            .collect();

        let mut rows = Vec::with_capacity(total);
        for (conversation, handle) in conversations.iter().zip(handles) {
            let outcome = handle.await.unwrap_or_else(|e| {
                error!(uuid = %conversation.uuid, error = %e, "scoring task aborted");
                ScoreOutcome::Failed {
                    reason: format!("Error: scoring task aborted: {}", e),
                }
            });
            rows.push(ScoreRow {
                rank: 0,
                uuid: conversation.uuid.clone(),
                title: conversation.name.clone(),
                outcome,
                created_at: conversation.created_at,
            });
        }
        bar.finish_with_message("scoring complete");
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::CsvScoreCache;
    use crate::adapters::ui::tui::AutoConfirm;
    use crate::domain::{ExportStats, Message, Sender};
    use crate::usecases::scorer::testing::{ScriptedCompletion, fast_config};
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};

    struct NoSource {
        modified: Option<SystemTime>,
    }

    #[async_trait::async_trait]
    impl ConversationSource for NoSource {
        async fn load(&self) -> Result<(Vec<Conversation>, ExportStats), DomainError> {
            Ok((vec![], ExportStats::default()))
        }

        async fn last_modified(&self) -> Result<Option<SystemTime>, DomainError> {
            Ok(self.modified)
        }
    }

    struct Decline;

    #[async_trait::async_trait]
    impl InputPort for Decline {
        async fn confirm_scoring(&self, _: usize, _: &str) -> Result<bool, DomainError> {
            Ok(false)
        }
    }

    fn conversation(uuid: &str, name: &str, day: i64) -> Conversation {
        let at = DateTime::<Utc>::from_timestamp(1_700_000_000 + day * 86_400, 0).unwrap();
        Conversation {
            uuid: uuid.to_string(),
            name: name.to_string(),
            created_at: at,
            updated_at: at,
            messages: vec![Message {
                uuid: format!("{}-m", uuid),
                text: format!("marker-{}", uuid),
                sender: Sender::Human,
                created_at: at,
                attachments: vec![],
                files: vec![],
            }],
        }
    }

    fn service(
        port: Arc<ScriptedCompletion>,
        cache: Arc<dyn ScoreCachePort>,
        policy: CachePolicy,
        source_modified: Option<SystemTime>,
    ) -> AnalyzerService {
        AnalyzerService::new(
            Arc::new(Scorer::new(port, fast_config())),
            cache,
            Arc::new(NoSource {
                modified: source_modified,
            }),
            Arc::new(AutoConfirm),
            policy,
            10,
        )
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_table_is_ranked() {
        let dir = tempfile::tempdir().unwrap();
        let port = Arc::new(ScriptedCompletion::new(vec![
            ("marker-a", Ok(r#"{"score": 4, "reasoning": "meh"}"#)),
            ("marker-b", Err("HTTP request failed: reset")),
            ("marker-c", Ok(r#"{"score": 9, "reasoning": "great"}"#)),
            ("marker-d", Ok("not json at all")),
        ]));
        let cache = Arc::new(CsvScoreCache::new(dir.path().join("analysis.csv")));
        let svc = service(port.clone(), cache.clone(), CachePolicy::Reuse, None);
        let conversations = vec![
            conversation("a", "A", 0),
            conversation("b", "B", 1),
            conversation("c", "C", 2),
            conversation("d", "D", 3),
        ];

        let table = svc.analyze(&conversations).await.unwrap();

        assert_eq!(port.calls(), 4);
        let order: Vec<_> = table.rows().iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(order, ["c", "a", "b", "d"]);
        assert_eq!(table.rows()[0].rank, 1);
        assert_eq!(table.failed_count(), 2);
        let failed = &table.rows()[2];
        assert!(failed.outcome.score().is_none());
        assert!(failed.outcome.reasoning().starts_with("Error: "));
        assert!(failed.outcome.reasoning().contains("reset"));
        // persisted for the next run
        assert_eq!(cache.load().await.unwrap().unwrap(), table);
    }

    #[tokio::test]
    async fn test_existing_cache_is_reused_without_calls() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(CsvScoreCache::new(dir.path().join("analysis.csv")));
        let conversations = vec![conversation("a", "A", 0), conversation("b", "B", 1)];

        let first_port = Arc::new(ScriptedCompletion::new(vec![
            ("marker-a", Ok(r#"{"score": 2, "reasoning": "x"}"#)),
            ("marker-b", Ok(r#"{"score": 8, "reasoning": "y"}"#)),
        ]));
        let first = service(first_port, cache.clone(), CachePolicy::Reuse, None)
            .analyze(&conversations)
            .await
            .unwrap();

        let second_port = Arc::new(ScriptedCompletion::new(vec![]));
        let second = service(second_port.clone(), cache.clone(), CachePolicy::Reuse, None)
            .analyze(&conversations)
            .await
            .unwrap();

        assert_eq!(second, first);
        assert_eq!(second_port.calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_and_stale_cache_rescore() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(CsvScoreCache::new(dir.path().join("analysis.csv")));
        let conversations = vec![conversation("a", "A", 0)];
        let reply: Vec<(&str, Result<&str, &str>)> = vec![("marker-a", Ok(r#"{"score": 5, "reasoning": "x"}"#))];

        service(
            Arc::new(ScriptedCompletion::new(reply.clone())),
            cache.clone(),
            CachePolicy::Reuse,
            None,
        )
        .analyze(&conversations)
        .await
        .unwrap();

        let refresh_port = Arc::new(ScriptedCompletion::new(reply.clone()));
        service(refresh_port.clone(), cache.clone(), CachePolicy::Refresh, None)
            .analyze(&conversations)
            .await
            .unwrap();
        assert_eq!(refresh_port.calls(), 1);

        let newer_export = SystemTime::now() + Duration::from_secs(3600);
        let stale_port = Arc::new(ScriptedCompletion::new(reply.clone()));
        service(
            stale_port.clone(),
            cache.clone(),
            CachePolicy::ReuseIfFresh,
            Some(newer_export),
        )
        .analyze(&conversations)
        .await
        .unwrap();
        assert_eq!(stale_port.calls(), 1);

        let older_export = SystemTime::UNIX_EPOCH;
        let fresh_port = Arc::new(ScriptedCompletion::new(reply));
        service(
            fresh_port.clone(),
            cache,
            CachePolicy::ReuseIfFresh,
            Some(older_export),
        )
        .analyze(&conversations)
        .await
        .unwrap();
        assert_eq!(fresh_port.calls(), 0);
    }

    #[tokio::test]
    async fn test_declined_confirmation_makes_no_calls() {
        let dir = tempfile::tempdir().unwrap();
        let port = Arc::new(ScriptedCompletion::new(vec![]));
        let svc = AnalyzerService::new(
            Arc::new(Scorer::new(port.clone(), fast_config())),
            Arc::new(CsvScoreCache::new(dir.path().join("analysis.csv"))),
            Arc::new(NoSource { modified: None }),
            Arc::new(Decline),
            CachePolicy::Reuse,
            4,
        );

        let result = svc.analyze(&[conversation("a", "A", 0)]).await;

        assert!(matches!(result, Err(DomainError::Input(_))));
        assert_eq!(port.calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_scores_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(CsvScoreCache::new(dir.path().join("analysis.csv")));
        let svc = AnalyzerService::new(
            Arc::new(Scorer::new(
                Arc::new(crate::adapters::ai::MockAiAdapter::with_delay(1)),
                fast_config(),
            )),
            cache.clone(),
            Arc::new(NoSource { modified: None }),
            Arc::new(AutoConfirm),
            CachePolicy::Reuse,
            4,
        );

        let table = svc
            .analyze(&[conversation("a", "A", 0), conversation("b", "B", 1)])
            .await
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.failed_count(), 0);
        assert!(cache.load().await.unwrap().is_none());
    }

    /// Counts the peak number of calls in flight.
    struct Gauge {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl crate::ports::CompletionPort for Gauge {
        async fn complete(
            &self,
            _: &crate::ports::CompletionRequest,
        ) -> Result<String, DomainError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(r#"{"score": 1, "reasoning": "r"}"#.to_string())
        }

        fn model(&self) -> &str {
            "gauge"
        }
    }

    #[tokio::test]
    async fn test_worker_pool_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let gauge = Arc::new(Gauge {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let svc = AnalyzerService::new(
            Arc::new(Scorer::new(gauge.clone(), fast_config())),
            Arc::new(CsvScoreCache::new(dir.path().join("analysis.csv"))),
            Arc::new(NoSource { modified: None }),
            Arc::new(AutoConfirm),
            CachePolicy::Refresh,
            3,
        );
        let conversations: Vec<_> = (0..12)
            .map(|i| conversation(&format!("c{}", i), "C", i))
            .collect();

        let table = svc.analyze(&conversations).await.unwrap();

        assert_eq!(table.len(), 12);
        assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
        assert!(gauge.peak.load(Ordering::SeqCst) >= 1);
    }
}
