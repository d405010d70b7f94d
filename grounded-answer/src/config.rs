//! Runtime configuration loaded from environment variables.

use std::time::Duration;

/// Fallback number of chunks requested per question.
pub const DEFAULT_TOP_K: u64 = 6;

pub const ANALYSIS_MAX_TOKENS: u32 = 300;
pub const REWRITE_MAX_TOKENS: u32 = 200;
pub const ANSWER_MAX_TOKENS: u32 = 800;
pub const VALIDATION_MAX_TOKENS: u32 = 300;

/// Immutable settings handed to [`crate::AnswerService`] once at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Vector store collection searched for every question.
    pub collection: String,
    /// Used when a request asks for `top_k == 0`.
    pub default_top_k: u64,

    pub analysis_max_tokens: u32,
    pub rewrite_max_tokens: u32,
    pub answer_max_tokens: u32,
    pub validation_max_tokens: u32,

    /// Upper bound on one `answer` call. `None` disables the deadline.
    pub deadline: Option<Duration>,
}

impl PipelineConfig {
    /// Defaults for the given collection.
    ///
    /// # Example
    /// ```
    /// # use grounded_answer::PipelineConfig;
    /// let cfg = PipelineConfig::new("docs", 0);
    /// assert_eq!(cfg.default_top_k, 6);
    /// ```
    pub fn new(collection: impl Into<String>, default_top_k: u64) -> Self {
        Self {
            collection: collection.into(),
            default_top_k: if default_top_k == 0 {
                DEFAULT_TOP_K
            } else {
                default_top_k
            },
            analysis_max_tokens: ANALYSIS_MAX_TOKENS,
            rewrite_max_tokens: REWRITE_MAX_TOKENS,
            answer_max_tokens: ANSWER_MAX_TOKENS,
            validation_max_tokens: VALIDATION_MAX_TOKENS,
            deadline: None,
        }
    }

    /// Build from environment variables with sensible defaults.
    ///
    /// - `QDRANT_COLLECTION` (default `documents`)
    /// - `RAG_TOP_K` (default 6; `0` or garbage falls back to the default)
    /// - `ANSWER_MAX_TOKENS`, `VALIDATION_MAX_TOKENS`
    /// - `ANSWER_TIMEOUT_SECS` (unset or `0` disables the deadline)
    pub fn from_env() -> Self {
        let mut cfg = Self::new(
            env("QDRANT_COLLECTION", "documents"),
            parse("RAG_TOP_K", DEFAULT_TOP_K),
        );
        cfg.answer_max_tokens = parse("ANSWER_MAX_TOKENS", ANSWER_MAX_TOKENS);
        cfg.validation_max_tokens = parse("VALIDATION_MAX_TOKENS", VALIDATION_MAX_TOKENS);
        cfg.deadline = match parse("ANSWER_TIMEOUT_SECS", 0u64) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        cfg
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}
