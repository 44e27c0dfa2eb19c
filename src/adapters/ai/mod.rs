//! AI adapter module. Implements CompletionPort for LLM integration.
//!
//! Provides OpenAI-compatible adapter, mock adapter, prompt rendering and the
//! response parsing chain.

pub mod mock_adapter;
pub mod openai_adapter;
pub mod prompt;
pub mod response_parser;

pub use mock_adapter::{MOCK_MODEL, MockAiAdapter};
pub use openai_adapter::OpenAiAdapter;
pub use response_parser::parse_score_response;
