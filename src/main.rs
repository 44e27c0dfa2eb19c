//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run the pipeline.
//! No business logic here.

use convo_rank::adapters::ai::{MockAiAdapter, OpenAiAdapter};
use convo_rank::adapters::chart::PlottersChart;
use convo_rank::adapters::export::ExportFileSource;
use convo_rank::adapters::persistence::{CsvScoreCache, FsTranscriptSink};
use convo_rank::adapters::ui::RunInfo;
use convo_rank::adapters::ui::tui::{AutoConfirm, TuiInputPort};
use convo_rank::ports::{
    ChartPort, CompletionPort, ConversationSource, InputPort, ScoreCachePort, TranscriptSink,
};
use convo_rank::shared::config::AppConfig;
use convo_rank::usecases::report::{ReportContext, write_report};
use convo_rank::usecases::{AnalyzerService, Scorer, TimeSeriesAggregator, TranscriptExporter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CACHE_FILE: &str = "conversation_value_analysis.csv";
const CHART_FILE: &str = "conversation_value_over_time.png";
const REPORT_FILE: &str = "conversation_value_report.md";
const TRANSCRIPTS_DIR: &str = "conversations";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv::dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    let scoring = cfg.scoring_config().map_err(|e| anyhow::anyhow!("{}", e))?;
    let cache_policy = cfg.cache_policy().map_err(|e| anyhow::anyhow!("{}", e))?;

    let input_path = cfg.input_path_or_default();
    let output_dir = cfg.output_dir_or_default();
    info!(
        input = %input_path.display(),
        output = %output_dir.display(),
        ?cache_policy,
        "paths"
    );

    // --- Completion adapter ---
    let completion: Arc<dyn CompletionPort> = match cfg.ai_api_key() {
        Some(key) => {
            info!(
                model = %cfg.ai_model_or_default(),
                url = %cfg.ai_api_url_or_default(),
                "AI scoring enabled with OpenAI adapter"
            );
            Arc::new(OpenAiAdapter::new(
                cfg.ai_api_url_or_default(),
                key,
                cfg.ai_model_or_default(),
            ))
        }
        None => {
            warn!("CONVO_RANK_AI_API_KEY not set, using mock AI adapter");
            Arc::new(MockAiAdapter::new())
        }
    };

    convo_rank::adapters::ui::init_ui(&RunInfo {
        model: completion.model().to_string(),
        input: input_path.display().to_string(),
        output: output_dir.display().to_string(),
        cache_policy: format!("{:?}", cache_policy),
    });

    // --- Load (fatal on any malformed record) ---
    let source: Arc<dyn ConversationSource> = Arc::new(ExportFileSource::new(&input_path));
    let (conversations, stats) = source
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // --- Services ---
    let cache: Arc<dyn ScoreCachePort> = Arc::new(CsvScoreCache::new(output_dir.join(CACHE_FILE)));
    let input: Arc<dyn InputPort> = if cfg.assume_yes() {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TuiInputPort)
    };
    let scorer = Arc::new(Scorer::new(completion, scoring));
    let analyzer = AnalyzerService::new(
        scorer,
        cache,
        Arc::clone(&source),
        input,
        cache_policy,
        cfg.max_workers_or_default(),
    )
    .with_progress(true);

    let chart: Arc<dyn ChartPort> = Arc::new(PlottersChart::new(
        output_dir.join(CHART_FILE),
        cfg.chart_font_path(),
    ));
    let aggregator = TimeSeriesAggregator::new(chart, cfg.rolling_window_or_default());

    let sink: Arc<dyn TranscriptSink> =
        Arc::new(FsTranscriptSink::new(output_dir.join(TRANSCRIPTS_DIR)));
    let exporter = TranscriptExporter::new(sink, cfg.export_threshold_or_default());

    // --- Run: score -> chart + transcripts + report ---
    let table = analyzer
        .analyze(&conversations)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let (_series, chart_path) = aggregator
        .render(&table)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let exported = exporter
        .export(&conversations, &table)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let ctx = ReportContext {
        generated_at: Some(chrono::Utc::now()),
        stats: Some(stats),
        exported,
        chart: Some(chart_path),
        window: aggregator.window(),
    };
    let report_path = write_report(&output_dir.join(REPORT_FILE), &table, &ctx)
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    info!(
        scored = table.len() - table.failed_count(),
        failed = table.failed_count(),
        exported = ctx.exported.len(),
        report = %report_path.display(),
        "done"
    );
    Ok(())
}
