//! Transcript exporter. Writes every high-scoring conversation to a text file.
//!
//! Rows are joined back to conversations by UUID, so two conversations sharing a
//! title never shadow each other.

use crate::domain::{Conversation, DomainError, ScoreTable};
use crate::ports::TranscriptSink;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Longest file stem produced from a title, in characters.
const MAX_STEM_CHARS: usize = 120;

/// Turns a conversation title into a portable file stem.
pub fn file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(MAX_STEM_CHARS)
        .collect();
    let trimmed = cleaned.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Claims a stem not used yet in this run: `base`, then `base (<uuid8>)`, then
/// `base (<uuid8> 2)`, `base (<uuid8> 3)` and so on.
fn unique_stem(used: &mut HashSet<String>, base: &str, uuid: &str) -> String {
    let short: String = uuid.chars().take(8).collect();
    let mut candidate = base.to_string();
    let mut attempt = 1;
    while !used.insert(candidate.clone()) {
        candidate = if attempt == 1 {
            format!("{} ({})", base, short)
        } else {
            format!("{} ({} {})", base, short, attempt)
        };
        attempt += 1;
    }
    candidate
}

/// Human-readable transcript: header, then one heading per message in export order.
pub fn render_transcript(conversation: &Conversation) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", conversation.name));
    out.push_str(&format!(
        "Created: {} | Updated: {} | Messages: {} | Words: {}\n\n",
        conversation.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        conversation.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        conversation.messages.len(),
        conversation.word_count()
    ));
    out.push_str("---\n\n");

    for msg in &conversation.messages {
        out.push_str(&format!(
            "## {} ({})\n\n",
            msg.sender,
            msg.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        out.push_str(msg.text.trim_end());
        out.push_str("\n\n");

        if !msg.attachments.is_empty() {
            out.push_str("Attachments:\n");
            for att in &msg.attachments {
                out.push_str(&format!("- {}\n", att));
            }
            out.push('\n');
        }
        if !msg.files.is_empty() {
            out.push_str("Files:\n");
            for file in &msg.files {
                out.push_str(&format!("- {}\n", file));
            }
            out.push('\n');
        }
        out.push_str("---\n\n");
    }
    out
}

/// Exports conversations whose score is at or above the threshold.
pub struct TranscriptExporter {
    sink: Arc<dyn TranscriptSink>,
    threshold: u8,
}

impl TranscriptExporter {
    pub fn new(sink: Arc<dyn TranscriptSink>, threshold: u8) -> Self {
        Self { sink, threshold }
    }

    /// Writes one file per qualifying row, in rank order. A title already used in
    /// this run gets the UUID prefix appended to keep names unique.
    pub async fn export(
        &self,
        conversations: &[Conversation],
        table: &ScoreTable,
    ) -> Result<Vec<PathBuf>, DomainError> {
        let by_uuid: HashMap<&str, &Conversation> = conversations
            .iter()
            .map(|c| (c.uuid.as_str(), c))
            .collect();
        let mut used_stems = HashSet::new();
        let mut written = Vec::new();

        let qualifying = table
            .rows()
            .iter()
            .filter(|r| r.outcome.score().is_some_and(|s| s.value() >= self.threshold));
        for row in qualifying {
            let Some(conversation) = by_uuid.get(row.uuid.as_str()) else {
                warn!(uuid = %row.uuid, title = %row.title, "scored conversation not in export; skipping");
                continue;
            };

            let stem = unique_stem(
                &mut used_stems,
                &file_stem(&conversation.name),
                &conversation.uuid,
            );

            let path = self
                .sink
                .write_transcript(&stem, &render_transcript(conversation))
                .await?;
            written.push(path);
        }

        info!(
            exported = written.len(),
            threshold = self.threshold,
            "transcript export complete"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::FsTranscriptSink;
    use crate::domain::{
        Attachment, FileReference, Message, Score, ScoreOutcome, ScoreResult, ScoreRow, Sender,
    };
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn conversation(uuid: &str, name: &str, texts: &[&str]) -> Conversation {
        Conversation {
            uuid: uuid.to_string(),
            name: name.to_string(),
            created_at: at(0),
            updated_at: at(60),
            messages: texts
                .iter()
                .enumerate()
                .map(|(i, t)| Message {
                    uuid: format!("{}-{}", uuid, i),
                    text: t.to_string(),
                    sender: if i % 2 == 0 {
                        Sender::Human
                    } else {
                        Sender::Other("assistant".to_string())
                    },
                    created_at: at(i as i64),
                    attachments: vec![],
                    files: vec![],
                })
                .collect(),
        }
    }

    fn row(conv: &Conversation, score: i64) -> ScoreRow {
        ScoreRow {
            rank: 0,
            uuid: conv.uuid.clone(),
            title: conv.name.clone(),
            outcome: ScoreOutcome::Scored(ScoreResult {
                score: Score::new(score).unwrap(),
                reasoning: String::new(),
            }),
            created_at: conv.created_at,
        }
    }

    #[test]
    fn test_file_stem_sanitizes() {
        assert_eq!(file_stem("a/b\\c:d?"), "a_b_c_d_");
        assert_eq!(file_stem("  "), "untitled");
        assert_eq!(file_stem("notes..."), "notes");
        assert_eq!(file_stem(&"x".repeat(500)).chars().count(), MAX_STEM_CHARS);
    }

    #[test]
    fn test_render_transcript_headings_in_order() {
        let mut conv = conversation("c1", "Rust tips", &["first question", "first answer", "follow up"]);
        conv.messages[1].attachments.push(Attachment {
            file_name: "log.txt".to_string(),
            file_size: 12,
            file_type: "txt".to_string(),
            extracted_content: "ignored".to_string(),
        });
        conv.messages[1].files.push(FileReference {
            file_name: "img.png".to_string(),
        });

        let text = render_transcript(&conv);

        assert!(text.starts_with("# Rust tips\n"));
        let headings: Vec<_> = text.lines().filter(|l| l.starts_with("## ")).collect();
        assert_eq!(headings.len(), 3);
        assert!(headings[0].starts_with("## human ("));
        assert!(headings[1].starts_with("## assistant ("));
        let first = text.find("first question").unwrap();
        let second = text.find("first answer").unwrap();
        let third = text.find("follow up").unwrap();
        assert!(first < second && second < third);
        assert!(text.contains("- Attachment(file_name=log.txt, file_size=12, file_type=txt)"));
        assert!(text.contains("- FileReference(file_name=img.png)"));
    }

    #[tokio::test]
    async fn test_exports_exactly_the_high_scorers() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("conversations");
        let exporter = TranscriptExporter::new(Arc::new(FsTranscriptSink::new(&out)), 9);
        let keep_a = conversation("a", "Keep A", &["hi"]);
        let keep_b = conversation("b", "Keep B", &["hey", "yo"]);
        let skip = conversation("c", "Skip", &["meh"]);
        let table = ScoreTable::ranked(vec![row(&keep_a, 9), row(&keep_b, 10), row(&skip, 8)]);

        let written = exporter
            .export(&[keep_a, keep_b, skip], &table)
            .await
            .unwrap();

        assert_eq!(written.len(), 2);
        let mut names: Vec<_> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["Keep A.txt", "Keep B.txt"]);
    }

    /// Duplicate titles: the UUID join exports only the conversation that scored.
    #[tokio::test]
    async fn test_duplicate_titles_join_by_uuid() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("conversations");
        let exporter = TranscriptExporter::new(Arc::new(FsTranscriptSink::new(&out)), 9);
        let good = conversation("11111111-aaaa", "Trip Planning", &["good plan"]);
        let bad = conversation("22222222-bbbb", "Trip Planning", &["bad plan"]);
        let table = ScoreTable::ranked(vec![row(&good, 9), row(&bad, 2)]);

        let written = exporter
            .export(&[good.clone(), bad.clone()], &table)
            .await
            .unwrap();

        assert_eq!(written, vec![out.join("Trip Planning.txt")]);
        let body = std::fs::read_to_string(&written[0]).unwrap();
        assert!(body.contains("good plan"));
        assert!(!body.contains("bad plan"));
    }

    /// Duplicate titles that both qualify get distinct file names.
    #[tokio::test]
    async fn test_duplicate_qualifying_titles_are_disambiguated() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("conversations");
        let exporter = TranscriptExporter::new(Arc::new(FsTranscriptSink::new(&out)), 9);
        let first = conversation("11111111-aaaa", "Trip Planning", &["one"]);
        let second = conversation("22222222-bbbb", "Trip Planning", &["two"]);
        let table = ScoreTable::ranked(vec![row(&first, 10), row(&second, 9)]);

        let written = exporter.export(&[first, second], &table).await.unwrap();

        assert_eq!(
            written,
            vec![
                out.join("Trip Planning.txt"),
                out.join("Trip Planning (22222222).txt")
            ]
        );
        assert!(std::fs::read_to_string(&written[1]).unwrap().contains("two"));
    }

    /// A title that already looks like a disambiguated name must not be overwritten.
    #[tokio::test]
    async fn test_disambiguated_name_never_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("conversations");
        let exporter = TranscriptExporter::new(Arc::new(FsTranscriptSink::new(&out)), 9);
        let lookalike = conversation("aaaaaaaa-1111", "T (bbbbbbbb)", &["lookalike"]);
        let plain = conversation("cccccccc-3333", "T", &["plain"]);
        let clash = conversation("bbbbbbbb-2222", "T", &["clash"]);
        let table =
            ScoreTable::ranked(vec![row(&lookalike, 10), row(&plain, 10), row(&clash, 10)]);

        let written = exporter
            .export(&[lookalike, plain, clash], &table)
            .await
            .unwrap();

        assert_eq!(
            written,
            vec![
                out.join("T (bbbbbbbb).txt"),
                out.join("T.txt"),
                out.join("T (bbbbbbbb 2).txt")
            ]
        );
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 3);
        assert!(std::fs::read_to_string(&written[0]).unwrap().contains("lookalike"));
        assert!(std::fs::read_to_string(&written[2]).unwrap().contains("clash"));
    }

    #[tokio::test]
    async fn test_failed_rows_and_unknown_uuids_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("conversations");
        let exporter = TranscriptExporter::new(Arc::new(FsTranscriptSink::new(&out)), 9);
        let present = conversation("p", "Present", &["x"]);
        let missing = conversation("m", "Missing", &["y"]);
        let table = ScoreTable::ranked(vec![
            row(&missing, 10),
            ScoreRow {
                outcome: ScoreOutcome::Failed {
                    reason: "Error: x".to_string(),
                },
                ..row(&present, 0)
            },
        ]);

        let written = exporter.export(&[present], &table).await.unwrap();

        assert!(written.is_empty());
        assert!(!out.exists());
    }
}
