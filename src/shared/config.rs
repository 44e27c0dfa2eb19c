//! Application configuration. API credentials, paths, pipeline knobs.
//!
//! Loaded once in `main` and never mutated afterwards; the scoring-specific part is
//! handed to the scorer as an immutable [`ScoringConfig`].

use crate::adapters::ai::prompt::{DEFAULT_RUBRIC, MESSAGES_SLOT};
use crate::domain::DomainError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound on concurrent scoring calls.
pub const DEFAULT_MAX_WORKERS: usize = 10;
/// Trailing window of the rolling average, in conversations.
pub const DEFAULT_ROLLING_WINDOW: usize = 40;
/// Minimum score for a conversation to be exported as a transcript.
pub const DEFAULT_EXPORT_THRESHOLD: u8 = 9;
/// Pause after every completion call.
pub const DEFAULT_CALL_DELAY_MS: u64 = 1000;
/// Cap on the rendered transcript inserted into the prompt.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 100_000;

/// What to do when a score cache already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Use the cache verbatim, whatever its age.
    #[default]
    Reuse,
    /// Ignore the cache and score again.
    Refresh,
    /// Use the cache only if it is not older than the export file.
    ReuseIfFresh,
}

impl std::str::FromStr for CachePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reuse" => Ok(Self::Reuse),
            "refresh" => Ok(Self::Refresh),
            "reuse-if-fresh" | "reuse_if_fresh" => Ok(Self::ReuseIfFresh),
            other => Err(DomainError::Config(format!(
                "unknown cache policy `{}` (expected reuse, refresh or reuse-if-fresh)",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Export file. Read from CONVO_RANK_INPUT_PATH.
    #[serde(default)]
    pub input_path: Option<String>,

    /// Directory for the cache, chart, report and transcripts. Read from CONVO_RANK_OUTPUT_DIR.
    #[serde(default)]
    pub output_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// AI API key. Read from CONVO_RANK_AI_API_KEY.
    #[serde(default)]
    pub ai_api_key: Option<String>,

    /// AI API URL. Defaults to OpenAI. Read from CONVO_RANK_AI_API_URL.
    #[serde(default)]
    pub ai_api_url: Option<String>,

    /// AI model name. Defaults to "gpt-4o-mini". Read from CONVO_RANK_AI_MODEL.
    #[serde(default)]
    pub ai_model: Option<String>,

    /// File holding the scoring rubric; must contain `{messages}`. Read from CONVO_RANK_PROMPT_PATH.
    #[serde(default)]
    pub prompt_path: Option<String>,

    /// Delay in ms after every completion call (rate limiting). Read from CONVO_RANK_CALL_DELAY_MS.
    #[serde(default)]
    pub call_delay_ms: Option<u64>,

    /// Max concurrent scoring calls. Read from CONVO_RANK_MAX_WORKERS.
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Max characters of transcript placed in the prompt. Read from CONVO_RANK_MAX_PROMPT_CHARS.
    #[serde(default)]
    pub max_prompt_chars: Option<usize>,

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Configuration
    // ─────────────────────────────────────────────────────────────────────────
    /// Rolling average window. Read from CONVO_RANK_ROLLING_WINDOW.
    #[serde(default)]
    pub rolling_window: Option<usize>,

    /// Transcript export threshold. Read from CONVO_RANK_EXPORT_THRESHOLD.
    #[serde(default)]
    pub export_threshold: Option<u8>,

    /// reuse | refresh | reuse-if-fresh. Read from CONVO_RANK_CACHE_POLICY.
    #[serde(default)]
    pub cache_policy: Option<String>,

    /// Skip the confirmation prompt before a paid run. Read from CONVO_RANK_ASSUME_YES.
    #[serde(default)]
    pub assume_yes: Option<bool>,

    /// TrueType font for chart labels. Read from CONVO_RANK_CHART_FONT_PATH.
    #[serde(default)]
    pub chart_font_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("CONVO_RANK").try_parsing(true));
        if let Ok(path) = std::env::var("CONVO_RANK_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // OPENAI_API_KEY is honoured too so an existing shell setup just works
        if cfg.ai_api_key.is_none() {
            cfg.ai_api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
        }
        Ok(cfg)
    }

    pub fn input_path_or_default(&self) -> PathBuf {
        PathBuf::from(
            self.input_path
                .as_deref()
                .unwrap_or("inputs/conversations.json"),
        )
    }

    pub fn output_dir_or_default(&self) -> PathBuf {
        PathBuf::from(self.output_dir.as_deref().unwrap_or("outputs"))
    }

    /// Returns max concurrent workers. Defaults to 10; never below 1.
    pub fn max_workers_or_default(&self) -> usize {
        self.max_workers.unwrap_or(DEFAULT_MAX_WORKERS).max(1)
    }

    /// Returns the rolling window. Defaults to 40; never below 1.
    pub fn rolling_window_or_default(&self) -> usize {
        self.rolling_window.unwrap_or(DEFAULT_ROLLING_WINDOW).max(1)
    }

    pub fn export_threshold_or_default(&self) -> u8 {
        self.export_threshold.unwrap_or(DEFAULT_EXPORT_THRESHOLD)
    }

    pub fn call_delay_ms_or_default(&self) -> u64 {
        self.call_delay_ms.unwrap_or(DEFAULT_CALL_DELAY_MS)
    }

    pub fn max_prompt_chars_or_default(&self) -> usize {
        self.max_prompt_chars.unwrap_or(DEFAULT_MAX_PROMPT_CHARS)
    }

    pub fn chart_font_path(&self) -> Option<PathBuf> {
        self.chart_font_path.as_deref().map(PathBuf::from)
    }

    pub fn assume_yes(&self) -> bool {
        self.assume_yes.unwrap_or(false)
    }

    pub fn cache_policy(&self) -> Result<CachePolicy, DomainError> {
        self.cache_policy
            .as_deref()
            .map(str::parse)
            .unwrap_or(Ok(CachePolicy::default()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // AI Configuration Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the AI API key if configured.
    pub fn ai_api_key(&self) -> Option<String> {
        self.ai_api_key.clone().filter(|k| !k.is_empty())
    }

    /// Returns the AI API URL. Defaults to OpenAI chat completions endpoint.
    pub fn ai_api_url_or_default(&self) -> String {
        self.ai_api_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string())
    }

    /// Returns the AI model name. Defaults to "gpt-4o-mini".
    pub fn ai_model_or_default(&self) -> String {
        self.ai_model
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string())
    }

    /// Builds the immutable scoring configuration. Reads the rubric file if one is set.
    pub fn scoring_config(&self) -> Result<ScoringConfig, DomainError> {
        let template = match self.prompt_path.as_deref() {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| DomainError::Config(format!("read prompt {}: {}", path, e)))?,
            None => DEFAULT_RUBRIC.to_string(),
        };
        ScoringConfig::new(
            template,
            Duration::from_millis(self.call_delay_ms_or_default()),
            self.max_prompt_chars_or_default(),
        )
    }
}

/// Everything the scorer needs besides the completion port. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    prompt_template: String,
    call_delay: Duration,
    max_prompt_chars: usize,
}

impl ScoringConfig {
    /// Fails when the template has no `{messages}` slot.
    pub fn new(
        prompt_template: String,
        call_delay: Duration,
        max_prompt_chars: usize,
    ) -> Result<Self, DomainError> {
        if !prompt_template.contains(MESSAGES_SLOT) {
            return Err(DomainError::Config(format!(
                "prompt template has no {} slot",
                MESSAGES_SLOT
            )));
        }
        Ok(Self {
            prompt_template,
            call_delay,
            max_prompt_chars,
        })
    }

    pub fn prompt_template(&self) -> &str {
        &self.prompt_template
    }

    pub fn call_delay(&self) -> Duration {
        self.call_delay
    }

    pub fn max_prompt_chars(&self) -> usize {
        self.max_prompt_chars
    }
}
