//! Default LLM configs loaded strictly from environment variables.
//!
//! Two roles are supported, each for either **OpenAI** or **Ollama**:
//!
//! - **Chat**      → structured chat completions (answer, validation, correction)
//! - **Embedding** → embedding generator for retrieval
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`         = provider kind (`openai` | `ollama`), defaults to `openai`
//! - `LLM_MAX_TOKENS`   = optional default max tokens (u32)
//! - `LLM_TIMEOUT_SECS` = optional request timeout (u64)
//! - `EMBEDDING_DIM`    = optional expected embedding size (u32)
//!
//! OpenAI-specific:
//! - `OPENAI_API_KEY`         = API key (mandatory)
//! - `OPENAI_URL`             = base URL, defaults to `https://api.openai.com`
//! - `OPENAI_CHAT_MODEL`      = chat model (mandatory)
//! - `OPENAI_EMBEDDING_MODEL` = embedding model (mandatory)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (mandatory)
//! - `OLLAMA_MODEL`                = chat model (mandatory)
//! - `EMBEDDING_MODEL`             = embedding model (mandatory)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint,
    },
};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Reads `LLM_KIND`, defaulting to OpenAI.
///
/// # Errors
/// [`ConfigError::UnsupportedProvider`] for unknown kinds.
pub fn provider_kind() -> Result<LlmProvider, AiLlmError> {
    match opt_env("LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::OpenAI),
    }
}

/// Resolves the Ollama endpoint strictly from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if both are missing
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("OLLAMA_PORT") {
        let _ = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "OLLAMA_PORT",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Err(AiLlmError::Config(ConfigError::MissingVar(
        "OLLAMA_URL or OLLAMA_PORT",
    )))
}

fn openai_endpoint() -> Result<String, AiLlmError> {
    let url = opt_env("OPENAI_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
    validate_http_endpoint("OPENAI_URL", &url)?;
    Ok(url)
}

fn embedding_dim() -> Result<Option<usize>, AiLlmError> {
    Ok(env_opt_u32("EMBEDDING_DIM")?.map(|d| d as usize))
}

/// Constructs the **chat** profile for the provider selected by `LLM_KIND`.
///
/// Every pipeline request overrides temperature with `0.0`; the profile value
/// only applies to ad-hoc calls.
///
/// # Defaults
/// - `temperature = Some(0.0)`
/// - `timeout_secs = Some(120)` unless `LLM_TIMEOUT_SECS` is set
pub fn config_chat() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_kind()?;
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.or(Some(120));

    let (endpoint, model, api_key) = match provider {
        LlmProvider::OpenAI => (
            openai_endpoint()?,
            must_env("OPENAI_CHAT_MODEL")?,
            Some(must_env("OPENAI_API_KEY")?),
        ),
        LlmProvider::Ollama => (ollama_endpoint()?, must_env("OLLAMA_MODEL")?, None),
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs,
        embedding_dim: None,
    };
    cfg.validate()?;
    Ok(cfg)
}

/// Constructs the **embedding** profile for the provider selected by `LLM_KIND`.
///
/// # Defaults
/// - `temperature = None` (not applicable)
/// - `timeout_secs = Some(30)` unless `LLM_TIMEOUT_SECS` is set
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let provider = provider_kind()?;
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.or(Some(30));

    let (endpoint, model, api_key) = match provider {
        LlmProvider::OpenAI => (
            openai_endpoint()?,
            must_env("OPENAI_EMBEDDING_MODEL")?,
            Some(must_env("OPENAI_API_KEY")?),
        ),
        LlmProvider::Ollama => (ollama_endpoint()?, must_env("EMBEDDING_MODEL")?, None),
    };

    let cfg = LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs,
        embedding_dim: embedding_dim()?,
    };
    cfg.validate()?;
    Ok(cfg)
}
