//! Time-series aggregation: trailing rolling mean of scores over creation time.

use crate::domain::{DomainError, ReportRow, ScoreTable};
use crate::ports::ChartPort;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Trailing mean over `window` values. Positions before the window fills are
/// `None` (no partial windows). A zero window is treated as 1.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            sum += v;
            if i >= window {
                sum -= values[i - window];
            }
            (i + 1 >= window).then(|| sum / window as f64)
        })
        .collect()
}

/// Scored rows in ascending creation order with their rolling average.
/// Failed rows carry no score and are left out of the series.
pub fn time_series(table: &ScoreTable, window: usize) -> Vec<ReportRow> {
    let mut scored: Vec<_> = table
        .rows()
        .iter()
        .filter_map(|row| row.outcome.score().map(|score| (row, score)))
        .collect();
    scored.sort_by(|(a, _), (b, _)| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.uuid.cmp(&b.uuid))
    });

    let values: Vec<f64> = scored
        .iter()
        .map(|(_, score)| f64::from(score.value()))
        .collect();
    scored
        .into_iter()
        .zip(rolling_mean(&values, window))
        .map(|((row, score), rolling_average)| ReportRow {
            uuid: row.uuid.clone(),
            title: row.title.clone(),
            score,
            created_at: row.created_at,
            rolling_average,
        })
        .collect()
}

/// Builds the series and hands it to the chart adapter.
pub struct TimeSeriesAggregator {
    chart: Arc<dyn ChartPort>,
    window: usize,
}

impl TimeSeriesAggregator {
    pub fn new(chart: Arc<dyn ChartPort>, window: usize) -> Self {
        Self {
            chart,
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Returns the series and the written chart path.
    pub fn render(&self, table: &ScoreTable) -> Result<(Vec<ReportRow>, PathBuf), DomainError> {
        let rows = time_series(table, self.window);
        let defined = rows.iter().filter(|r| r.rolling_average.is_some()).count();
        info!(
            rows = rows.len(),
            defined,
            window = self.window,
            "rolling average computed"
        );
        let path = self.chart.render_rolling_average(&rows, self.window)?;
        Ok((rows, path))
    }
}
