use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ConfigError, validate_range_f32};

/// Configuration for one LLM model profile.
///
/// # Fields
///
/// - `provider`: Which backend to use (Ollama, OpenAI).
/// - `model`: The model identifier (e.g., `"gpt-4o-mini"`, `"qwen3:14b"`).
/// - `endpoint`: Base URL of the API (local server or remote).
/// - `api_key`: Optional API key for providers that require authentication.
/// - `max_tokens`: Default max tokens when a request does not set one.
/// - `temperature`: Default temperature when a request does not set one.
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
/// - `embedding_dim`: Expected embedding size (embedding profiles only).
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "gpt-4o-mini".to_string(),
///     endpoint: "https://api.openai.com".to_string(),
///     api_key: Some("sk-...".to_string()),
///     max_tokens: Some(2048),
///     temperature: Some(0.0),
///     top_p: None,
///     timeout_secs: Some(30),
///     embedding_dim: None,
/// };
/// assert_eq!(cfg.provider, LlmProvider::OpenAI);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub embedding_dim: Option<usize>,
}

impl LlmModelConfig {
    /// Checks the model name and sampling parameters.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] when `model` is blank
    /// - [`ConfigError::OutOfRange`] when `temperature` is outside `0.0..=2.0`
    ///   or `top_p` is outside `0.0..=1.0`
    pub fn validate(&self) -> Result<(), AiLlmError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}
