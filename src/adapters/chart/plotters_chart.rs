//! Implements ChartPort with plotters: rolling average over creation time, as PNG.
//!
//! Text needs a TrueType font registered at runtime. When none can be found the
//! chart is still drawn, only without caption, mesh and axis labels.

use crate::domain::{DomainError, MAX_SCORE, ReportRow};
use crate::ports::ChartPort;
use chrono::{DateTime, Utc};
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

const CHART_SIZE: (u32, u32) = (1400, 700);

/// Fonts tried when none is configured.
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONT_READY: OnceLock<bool> = OnceLock::new();

fn chart_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::Chart(e.to_string())
}

/// Registers the first readable font as "sans-serif". Runs once per process.
fn ensure_font(configured: Option<&Path>) -> bool {
    *FONT_READY.get_or_init(|| {
        let candidates = configured
            .into_iter()
            .map(Path::to_path_buf)
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
            if register_font("sans-serif", FontStyle::Normal, bytes).is_ok() {
                info!(path = %path.display(), "chart font registered");
                return true;
            }
        }
        warn!("no usable chart font found; rendering chart without labels");
        false
    })
}

/// PNG line chart writer.
pub struct PlottersChart {
    path: PathBuf,
    font_path: Option<PathBuf>,
}

impl PlottersChart {
    pub fn new(path: impl AsRef<Path>, font_path: Option<PathBuf>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            font_path,
        }
    }
}

impl ChartPort for PlottersChart {
    fn render_rolling_average(
        &self,
        rows: &[ReportRow],
        window: usize,
    ) -> Result<PathBuf, DomainError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::FileSystem(format!("create chart dir: {}", e)))?;
        }
        let labelled = ensure_font(self.font_path.as_deref());

        let points: Vec<(i64, f64)> = rows
            .iter()
            .filter_map(|r| r.rolling_average.map(|avg| (r.created_at.timestamp(), avg)))
            .collect();
        let x_start = rows.first().map(|r| r.created_at.timestamp()).unwrap_or(0);
        let x_end = rows
            .last()
            .map(|r| r.created_at.timestamp())
            .unwrap_or(0)
            .max(x_start + 1);

        let root = BitMapBackend::new(&self.path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20);
        if labelled {
            builder
                .caption(
                    format!("Conversation value, {}-conversation rolling average", window),
                    ("sans-serif", 28),
                )
                .x_label_area_size(50)
                .y_label_area_size(60);
        }
        let mut chart = builder
            .build_cartesian_2d(x_start..x_end, 0f64..f64::from(MAX_SCORE))
            .map_err(chart_err)?;

        if labelled {
            let date_label = |ts: &i64| {
                DateTime::<Utc>::from_timestamp(*ts, 0)
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            };
            chart
                .configure_mesh()
                .x_desc("Created At")
                .y_desc("Rolling average score")
                .x_labels(8)
                .x_label_formatter(&date_label)
                .draw()
                .map_err(chart_err)?;
        }

        chart
            .draw_series(LineSeries::new(points, BLUE.stroke_width(2)))
            .map_err(chart_err)?;
        root.present().map_err(chart_err)?;

        info!(path = %self.path.display(), rows = rows.len(), window, "chart rendered");
        Ok(self.path.clone())
    }
}
