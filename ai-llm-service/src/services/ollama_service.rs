//! Lightweight Ollama service for chat completions and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`      : non-streaming chat (`stream=false`)
//! - `POST {endpoint}/api/embeddings`: one embedding per request
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::chat::{ChatCompletionRequest, ChatMessage};
//! use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     provider: LlmProvider::Ollama,
//!     model: "qwen3:14b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     api_key: None,
//!     max_tokens: Some(256),
//!     temperature: Some(0.0),
//!     top_p: None,
//!     timeout_secs: Some(30),
//!     embedding_dim: None,
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//! let out = svc
//!     .chat(&ChatCompletionRequest {
//!         messages: vec![ChatMessage::user("Write a haiku about Rust.")],
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", out.content);
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use futures::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{
    chat::{ChatCompletionRequest, ChatCompletionResponse, ResponseFormat, Role, Usage},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
        transport_error,
    },
    provider::{BoxFuture, ChatProvider, EmbeddingProvider},
};

/// Max in-flight `/api/embeddings` requests for one batch.
const EMBED_CONCURRENCY: usize = 4;

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::Config`] if the model name or sampling parameters are invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        cfg.validate()?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/api/chat", base);
        let url_embeddings = format!("{}/api/embeddings", base);

        Ok(Self {
            client,
            cfg,
            timeout,
            url_chat,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** chat request via `/api/chat`.
    ///
    /// Mapped options:
    /// - `format`       ← `"json"` when a JSON response format is requested
    /// - `num_predict`  ← request/profile `max_tokens`
    /// - `temperature`  ← request/profile `temperature`
    /// - `top_p`        ← request/profile `top_p`
    ///
    /// # Errors
    /// - `EmptyMessages` when `req.messages` is empty (no HTTP call is made)
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - [`AiLlmError::Timeout`] when the request exceeds the client timeout
    /// - `Decode` if response cannot be parsed
    /// - `EmptyChoices` if the response carries no message
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn chat(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiLlmError> {
        if req.messages.is_empty() {
            return Err(ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyMessages).into());
        }

        let started = Instant::now();
        let body = WireChatRequest::from_request(&self.cfg, req);

        debug!("POST {}", self.url_chat);
        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_chat).await);
        }

        let out: WireChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!("serde error: {e}; ensure `stream=false` is used")),
            )
        })?;

        let message = out
            .message
            .ok_or_else(|| ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices))?;

        if message.content.is_empty() {
            warn!("ollama chat returned empty content");
        }

        let prompt_tokens = out.prompt_eval_count.unwrap_or(0);
        let completion_tokens = out.eval_count.unwrap_or(0);

        info!(
            latency_ms = started.elapsed().as_millis(),
            completion_tokens, "chat completion completed"
        );

        Ok(ChatCompletionResponse {
            content: message.content,
            role: message.role.unwrap_or(Role::Assistant),
            finish_reason: out.done_reason.unwrap_or_default(),
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        })
    }

    /// Retrieves one embedding via `/api/embeddings`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - [`AiLlmError::Timeout`] when the request exceeds the client timeout
    /// - `Decode` if response cannot be parsed
    pub async fn embedding(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = WireEmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(self.status_error(resp, &self.url_embeddings).await);
        }

        let out: WireEmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embedding: number[] }}`"
                )),
            )
        })?;

        Ok(out.embedding)
    }

    /// Embeds a batch with bounded concurrency, preserving input order.
    #[instrument(skip_all, fields(model = %self.cfg.model, inputs = inputs.len()))]
    pub async fn embeddings(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let futs: Vec<_> = inputs.iter().map(|text| self.embedding(text)).collect();
        stream::iter(futs)
            .buffered(EMBED_CONCURRENCY)
            .try_collect()
            .await
    }

    async fn status_error(&self, resp: reqwest::Response, url: &str) -> AiLlmError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);
        warn!(%status, %url, %snippet, "ollama returned non-success status");
        ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into()
    }
}

impl ChatProvider for OllamaService {
    fn create_chat_completion<'a>(
        &'a self,
        req: ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<ChatCompletionResponse, AiLlmError>> {
        Box::pin(async move { self.chat(&req).await })
    }
}

impl EmbeddingProvider for OllamaService {
    fn create_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>> {
        Box::pin(self.embeddings(texts))
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct WireChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: WireOptions,
}

impl<'a> WireChatRequest<'a> {
    fn from_request(cfg: &'a LlmModelConfig, req: &'a ChatCompletionRequest) -> Self {
        let format = match req.response_format {
            Some(ResponseFormat::JsonObject) | Some(ResponseFormat::JsonSchema) => Some("json"),
            Some(ResponseFormat::Text) | None => None,
        };

        Self {
            model: &cfg.model,
            messages: req
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            stream: false,
            format,
            options: WireOptions {
                temperature: req.temperature.or(cfg.temperature),
                top_p: req.top_p.or(cfg.top_p),
                num_predict: req.max_tokens.or(cfg.max_tokens),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct WireOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireChatResponse {
    #[serde(default)]
    message: Option<WireMessageOut>,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireMessageOut {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct WireEmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct WireEmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatMessage;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "qwen3:14b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.7),
            top_p: Some(0.9),
            timeout_secs: Some(5),
            embedding_dim: None,
        }
    }

    #[test]
    fn json_object_maps_to_format_json() {
        let cfg = cfg();
        let req = ChatCompletionRequest {
            messages: vec![ChatMessage::user("hi")],
            temperature: Some(0.0),
            max_tokens: Some(300),
            top_p: None,
            response_format: Some(ResponseFormat::JsonObject),
        };
        let v = serde_json::to_value(WireChatRequest::from_request(&cfg, &req)).unwrap();
        assert_eq!(v["format"], "json");
        assert_eq!(v["stream"], false);
        assert_eq!(v["options"]["temperature"], 0.0);
        assert_eq!(v["options"]["num_predict"], 300);
        assert!((v["options"]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let mut c = cfg();
        c.endpoint = "localhost:11434".into();
        assert!(OllamaService::new(c).is_err());
    }

    #[tokio::test]
    async fn empty_batch_needs_no_requests() {
        let svc = OllamaService::new(cfg()).unwrap();
        let out = svc.embeddings(&[]).await.unwrap();
        assert!(out.is_empty());
    }
}
