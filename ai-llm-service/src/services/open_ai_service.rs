//! OpenAI chat and embeddings client.
//!
//! Minimal, non-streaming client around the OpenAI REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1/chat/completions: chat completion (non-streaming)
//! - POST {endpoint}/v1/embeddings      : embeddings for a list of inputs
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! Errors are normalized via unified error types in `error_handler`.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{
    chat::{ChatCompletionRequest, ChatCompletionResponse, ResponseFormat, Role, Usage},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
        transport_error,
    },
    provider::{BoxFuture, ChatProvider, EmbeddingProvider},
};

/// Thin client for the OpenAI API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not OpenAI
    /// - `MissingApiKey` if `cfg.api_key` is `None`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::Config`] if the model name or sampling parameters are invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::OpenAI {
            return Err(
                ProviderError::new(Provider::OpenAI, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::OpenAI, ProviderErrorKind::MissingApiKey)
        })?;

        cfg.validate()?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_chat = format!("{}/v1/chat/completions", base);
        let url_embeddings = format!("{}/v1/embeddings", base);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_chat,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** chat completion (`/v1/chat/completions`).
    ///
    /// Request values win over profile defaults for `temperature`,
    /// `max_tokens` and `top_p`.
    ///
    /// # Errors
    /// - `EmptyMessages` when `req.messages` is empty (no HTTP call is made)
    /// - `UnsupportedResponseFormat` for [`ResponseFormat::JsonSchema`], since
    ///   requests carry no schema body (no HTTP call is made)
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Timeout`] when the request exceeds the client timeout
    /// - `Decode` if the JSON cannot be parsed
    /// - `EmptyChoices` if no choices are returned
    pub async fn chat(
        &self,
        req: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AiLlmError> {
        if req.messages.is_empty() {
            return Err(ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyMessages).into());
        }
        if req.response_format == Some(ResponseFormat::JsonSchema) {
            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::UnsupportedResponseFormat(ResponseFormat::JsonSchema.as_str()),
            )
            .into());
        }

        let started = Instant::now();
        let body = WireChatRequest::from_request(&self.cfg, req);

        debug!(
            model = %self.cfg.model,
            messages = req.messages.len(),
            response_format = ?req.response_format,
            "POST {}", self.url_chat
        );

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/chat/completions returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: WireChatResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/chat/completions response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `choices[0].message.content`"
                    )),
                )
                .into());
            }
        };

        let usage = out.usage.unwrap_or_default();
        let choice = out
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        let content = choice.message.content.unwrap_or_default();
        if content.is_empty() {
            warn!(
                model = %self.cfg.model,
                finish_reason = choice.finish_reason.as_deref().unwrap_or(""),
                "chat completion returned empty content"
            );
        }

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            total_tokens = usage.total_tokens,
            "chat completion completed"
        );

        Ok(ChatCompletionResponse {
            content,
            role: choice.message.role.unwrap_or(Role::Assistant),
            finish_reason: choice.finish_reason.unwrap_or_default(),
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }

    /// Retrieves embeddings for all `inputs` via one `/v1/embeddings` call.
    ///
    /// Results are re-ordered by the `index` field the API returns, so the
    /// output order always matches the input order.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Timeout`] when the request exceeds the client timeout
    /// - `Decode` if the JSON cannot be parsed
    pub async fn embeddings(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let body = WireEmbeddingsRequest {
            model: &self.cfg.model,
            input: inputs,
            dimensions: self.cfg.embedding_dim,
        };

        debug!(
            model = %self.cfg.model,
            inputs = inputs.len(),
            "POST {}", self.url_embeddings
        );

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "OpenAI /v1/embeddings returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::OpenAI,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let mut out: WireEmbeddingsResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode /v1/embeddings response"
                );
                return Err(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `data[].embedding`"
                    )),
                )
                .into());
            }
        };

        out.data.sort_by_key(|d| d.index);

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            vectors = out.data.len(),
            "embeddings completed"
        );

        Ok(out.data.into_iter().map(|d| d.embedding).collect())
    }
}

impl ChatProvider for OpenAiService {
    fn create_chat_completion<'a>(
        &'a self,
        req: ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<ChatCompletionResponse, AiLlmError>> {
        Box::pin(async move { self.chat(&req).await })
    }
}

impl EmbeddingProvider for OpenAiService {
    fn create_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>> {
        Box::pin(self.embeddings(texts))
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for `/v1/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
struct WireChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

impl<'a> WireChatRequest<'a> {
    fn from_request(cfg: &'a LlmModelConfig, req: &'a ChatCompletionRequest) -> Self {
        let messages = req
            .messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
                name: m.name.as_deref(),
                tool_call_id: m.tool_call_id.as_deref(),
            })
            .collect();

        Self {
            model: &cfg.model,
            messages,
            temperature: req.temperature.or(cfg.temperature),
            top_p: req.top_p.or(cfg.top_p),
            max_tokens: req.max_tokens.or(cfg.max_tokens),
            response_format: req.response_format.map(|f| WireResponseFormat {
                kind: f.as_str(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct WireChatResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessageOut,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireMessageOut {
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Serialize)]
struct WireEmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct WireEmbeddingsResponse {
    data: Vec<WireEmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct WireEmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
