//! Chat export adapters. Implements ConversationSource.

pub mod json_export;

pub use json_export::{ExportFileSource, normalize_conversations};
