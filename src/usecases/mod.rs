//! Application use cases. Orchestrate domain logic via ports.

pub mod aggregator;
pub mod analyzer;
pub mod exporter;
pub mod report;
pub mod scorer;

pub use aggregator::TimeSeriesAggregator;
pub use analyzer::AnalyzerService;
pub use exporter::TranscriptExporter;
pub use scorer::Scorer;
