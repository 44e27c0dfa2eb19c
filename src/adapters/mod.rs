//! Infrastructure adapters. Implement outbound ports.
//!
//! LLM API, export file, flat-file persistence, chart rendering, terminal UI.
//! Map errors to DomainError.

pub mod ai;
pub mod chart;
pub mod export;
pub mod persistence;
pub mod ui;
