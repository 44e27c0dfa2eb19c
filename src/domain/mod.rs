//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod records;

pub use entities::{
    ExportStats, MAX_SCORE, ReportRow, Score, ScoreOutcome, ScoreResult, ScoreRow, ScoreTable,
};
pub use errors::{ConstructionError, DomainError};
pub use records::{Attachment, Conversation, FileReference, Message, Sender};
