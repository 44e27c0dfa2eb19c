//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

/// Raised by the record factories when an export object does not match the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("{entity}: missing field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity}: field `{field}` should be {expected}")]
    WrongType {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("{entity}: field `{field}` is not an RFC 3339 timestamp: {value}")]
    InvalidTimestamp {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Load error: {0}")]
    Load(String),

    /// Malformed record at position `index` of the export array.
    #[error("Malformed conversation at index {index}: {source}")]
    Construction {
        index: usize,
        #[source]
        source: ConstructionError,
    },

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),
}
