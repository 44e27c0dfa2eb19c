//! Robust parsing of the model's `{score, reasoning}` reply.
//!
//! Models do not always honour "JSON only". Parsing runs an ordered chain of
//! strategies, each returning `Some(object)` or `None`; the first hit wins. If every
//! strategy misses, the caller gets a scoring error, never a default score.

use crate::domain::{DomainError, MAX_SCORE, Score, ScoreResult};
use serde_json::Value;
use tracing::debug;

/// One way of recovering a JSON object from raw completion text.
pub type ParseStrategy = fn(&str) -> Option<Value>;

/// Strategies in the order they are tried.
pub const STRATEGIES: &[(&str, ParseStrategy)] = &[
    ("direct", parse_direct),
    ("fenced-block", parse_fenced_block),
    ("stripped-noise", parse_stripped),
];

fn object(value: Value) -> Option<Value> {
    value.is_object().then_some(value)
}

/// The whole reply is a JSON object.
pub fn parse_direct(raw: &str) -> Option<Value> {
    serde_json::from_str(raw.trim()).ok().and_then(object)
}

/// The first ```` ``` ```` fenced block (with or without a language tag) holds the object.
pub fn parse_fenced_block(raw: &str) -> Option<Value> {
    let start = raw.find("```")?;
    let after_fence = &raw[start + 3..];
    let body = after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let end = body.find("```")?;
    serde_json::from_str(body[..end].trim()).ok().and_then(object)
}

/// Quote/whitespace noise around the object, or the object encoded as a JSON string.
pub fn parse_stripped(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(inner) = serde_json::from_str::<String>(trimmed) {
        if let Some(v) = serde_json::from_str(inner.trim()).ok().and_then(object) {
            return Some(v);
        }
    }
    let stripped =
        trimmed.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`'));
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    if start >= end {
        return None;
    }
    serde_json::from_str(&stripped[start..=end])
        .ok()
        .and_then(object)
}

/// Runs the chain. Returns the winning strategy's name with the object.
pub fn extract_json(raw: &str) -> Option<(&'static str, Value)> {
    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| strategy(raw).map(|v| (*name, v)))
}

/// Checks the object against the `{score:int 0..=10, reasoning:string}` shape.
pub fn validate(value: &Value) -> Result<ScoreResult, DomainError> {
    let raw_score = value
        .get("score")
        .ok_or_else(|| DomainError::Scoring("response has no `score` field".to_string()))?;
    let score_int = raw_score.as_i64().ok_or_else(|| {
        DomainError::Scoring(format!("`score` is not an integer: {}", raw_score))
    })?;
    let score = Score::new(score_int).ok_or_else(|| {
        DomainError::Scoring(format!(
            "`score` {} is outside 0..={}",
            score_int, MAX_SCORE
        ))
    })?;
    let reasoning = value
        .get("reasoning")
        .ok_or_else(|| DomainError::Scoring("response has no `reasoning` field".to_string()))?
        .as_str()
        .ok_or_else(|| DomainError::Scoring("`reasoning` is not a string".to_string()))?
        .to_string();
    Ok(ScoreResult { score, reasoning })
}

/// Extracts and validates a score reply.
pub fn parse_score_response(raw: &str) -> Result<ScoreResult, DomainError> {
    let (strategy, value) = extract_json(raw).ok_or_else(|| {
        DomainError::Scoring(format!(
            "no JSON object in response: {}",
            raw.chars().take(200).collect::<String>()
        ))
    })?;
    debug!(strategy, "parsed score response");
    validate(&value)
}
