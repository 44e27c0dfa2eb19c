//! Markdown summary of a run: counts, score histogram, top conversations, failures.

use crate::domain::{DomainError, ExportStats, MAX_SCORE, ScoreTable};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Rows listed in the "Top conversations" table.
pub const TOP_ROWS: usize = 20;

/// Inputs to the report besides the table itself.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub generated_at: Option<DateTime<Utc>>,
    pub stats: Option<ExportStats>,
    pub exported: Vec<PathBuf>,
    pub chart: Option<PathBuf>,
    pub window: usize,
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

pub fn render_markdown_report(table: &ScoreTable, ctx: &ReportContext) -> String {
    let mut md = String::new();

    md.push_str("# Conversation Value Report\n\n");
    if let Some(at) = ctx.generated_at {
        md.push_str(&format!(
            "**Generated:** {}\n\n",
            at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    md.push_str("---\n\n");

    // Overview
    md.push_str("## 📊 Overview\n\n");
    if let Some(stats) = ctx.stats {
        md.push_str(&format!(
            "- Conversations loaded: {} ({} empty dropped)\n- Messages: {} | Words: {} | Bytes: {}\n",
            stats.conversations, stats.dropped_empty, stats.messages, stats.words, stats.bytes
        ));
    }
    md.push_str(&format!(
        "- Scored: {} | Failed: {}\n- Transcripts exported: {}\n",
        table.len() - table.failed_count(),
        table.failed_count(),
        ctx.exported.len()
    ));
    if let Some(chart) = &ctx.chart {
        md.push_str(&format!(
            "- Rolling average chart ({}-conversation window): `{}`\n",
            ctx.window,
            chart.display()
        ));
    }
    md.push('\n');

    // Histogram
    let mut buckets = [0usize; MAX_SCORE as usize + 1];
    for score in table.rows().iter().filter_map(|r| r.outcome.score()) {
        buckets[score.value() as usize] += 1;
    }
    md.push_str("## 📈 Score Distribution\n\n| Score | Count |\n|---:|---:|\n");
    for (score, count) in buckets.iter().enumerate().rev() {
        md.push_str(&format!("| {} | {} |\n", score, count));
    }
    md.push('\n');

    // Top rows
    let top: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.outcome.score().is_some())
        .take(TOP_ROWS)
        .collect();
    if !top.is_empty() {
        md.push_str("## 🏆 Top Conversations\n\n| Rank | Title | Score | Created | Reasoning |\n|---:|---|---:|---|---|\n");
        for row in top {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                row.rank,
                escape_cell(&row.title),
                row.outcome.score().map(|s| s.to_string()).unwrap_or_default(),
                row.created_at.format("%Y-%m-%d"),
                escape_cell(row.outcome.reasoning())
            ));
        }
        md.push('\n');
    }

    // Failures
    let failed: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.outcome.score().is_none())
        .collect();
    if !failed.is_empty() {
        md.push_str("## ⚠️ Failed Conversations\n\n");
        md.push_str("Delete the cache file (or set CONVO_RANK_CACHE_POLICY=refresh) to retry.\n\n");
        for row in failed {
            md.push_str(&format!(
                "- **{}** (`{}`): {}\n",
                escape_cell(&row.title),
                row.uuid,
                escape_cell(row.outcome.reasoning())
            ));
        }
        md.push('\n');
    }

    md.push_str("---\n");
    md.push_str("*Generated by convo-rank*\n");
    md
}

/// Renders and writes the report.
pub async fn write_report(
    path: &Path,
    table: &ScoreTable,
    ctx: &ReportContext,
) -> Result<PathBuf, DomainError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DomainError::FileSystem(format!("create report dir: {}", e)))?;
    }
    fs::write(path, render_markdown_report(table, ctx))
        .await
        .map_err(|e| DomainError::FileSystem(format!("Failed to write report: {}", e)))?;
    info!(path = %path.display(), "report generated");
    Ok(path.to_path_buf())
}
