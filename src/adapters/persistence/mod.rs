//! Flat-file persistence: score cache and transcript files.

pub mod csv_cache;
pub mod fs_transcripts;

pub use csv_cache::CsvScoreCache;
pub use fs_transcripts::FsTranscriptSink;
