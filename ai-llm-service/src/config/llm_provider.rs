use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for chat completions and embeddings.
///
/// Adding more providers later (e.g., Anthropic, Mistral API) is done by
/// extending this enum and the dispatch in `service_profiles`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime.
    Ollama,
    /// OpenAI-compatible REST API.
    OpenAI,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    /// Parses `LLM_KIND` values (`ollama`, `openai`, `chatgpt`), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds() {
        assert_eq!("Ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert_eq!(" chatgpt ".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert!("anthropic".parse::<LlmProvider>().is_err());
    }
}
