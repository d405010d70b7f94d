//! Shared LLM service with two profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - Implements [`ChatProvider`] and [`EmbeddingProvider`], routing to the
//!   backend selected by each profile.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_chat, config_embedding};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//! use ai_llm_service::EmbeddingProvider;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(config_chat()?, config_embedding()?));
//! let vectors = svc.create_embeddings(&["Ferris".to_string()]).await?;
//! println!("Embedding dim = {}", vectors[0].len());
//! # Ok(()) }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::warn;

use crate::{
    chat::{ChatCompletionRequest, ChatCompletionResponse},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, Provider, ProviderError, ProviderErrorKind},
    provider::{BoxFuture, ChatProvider, EmbeddingProvider},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Shared service that manages the **chat** and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat: LlmModelConfig,
    embedding: LlmModelConfig,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service from a chat and an embedding profile.
    ///
    /// Clients are built lazily on first use, so config problems surface on
    /// the first call that needs the profile.
    pub fn new(chat: LlmModelConfig, embedding: LlmModelConfig) -> Self {
        Self {
            chat,
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        }
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.chat, &self.embedding)
    }

    /// Completes a chat request using the **chat** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if client setup or the request fails.
    pub async fn chat(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiLlmError> {
        match self.chat.provider {
            LlmProvider::Ollama => self.get_or_init_ollama(&self.chat).await?.chat(req).await,
            LlmProvider::OpenAI => self.get_or_init_openai(&self.chat).await?.chat(req).await,
        }
    }

    /// Embeds every input using the **embedding** profile.
    ///
    /// When the profile declares `embedding_dim`, every vector is checked
    /// against it.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if embedding fails or a vector has the wrong size.
    pub async fn embed_all(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let (provider, vectors) = match self.embedding.provider {
            LlmProvider::Ollama => (
                Provider::Ollama,
                self.get_or_init_ollama(&self.embedding)
                    .await?
                    .embeddings(inputs)
                    .await?,
            ),
            LlmProvider::OpenAI => (
                Provider::OpenAI,
                self.get_or_init_openai(&self.embedding)
                    .await?
                    .embeddings(inputs)
                    .await?,
            ),
        };

        if let Some(want) = self.embedding.embedding_dim {
            if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
                warn!(got = bad.len(), want, "embedding dimension mismatch");
                return Err(ProviderError::new(
                    provider,
                    ProviderErrorKind::Decode(format!(
                        "embedding dimension {} != expected {want}",
                        bad.len()
                    )),
                )
                .into());
            }
        }

        Ok(vectors)
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

impl ChatProvider for LlmServiceProfiles {
    fn create_chat_completion<'a>(
        &'a self,
        req: ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<ChatCompletionResponse, AiLlmError>> {
        Box::pin(async move { self.chat(&req).await })
    }
}

impl EmbeddingProvider for LlmServiceProfiles {
    fn create_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>> {
        Box::pin(self.embed_all(texts))
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama(model: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: model.into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(5),
            embedding_dim: None,
        }
    }

    #[tokio::test]
    async fn clients_are_cached_per_config() {
        let svc = LlmServiceProfiles::new(ollama("chat"), ollama("embed"));
        let a = svc.get_or_init_ollama(&ollama("chat")).await.unwrap();
        let b = svc.get_or_init_ollama(&ollama("chat")).await.unwrap();
        let c = svc.get_or_init_ollama(&ollama("embed")).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn invalid_profile_surfaces_on_first_use() {
        let mut bad = ollama("chat");
        bad.endpoint = "nope".into();
        let svc = LlmServiceProfiles::new(bad, ollama("embed"));
        let err = svc.chat(&ChatCompletionRequest::default()).await.unwrap_err();
        assert!(matches!(err, AiLlmError::Provider(_)));
    }
}
