//! Shared LLM service: chat completions and embeddings over OpenAI or Ollama.
//!
//! - [`provider`] defines the [`ChatProvider`] / [`EmbeddingProvider`] contracts.
//! - [`services`] holds the HTTP clients implementing them.
//! - [`service_profiles::LlmServiceProfiles`] bundles a chat profile and an
//!   embedding profile behind one shareable handle.
//! - [`telemetry`] exposes a library-scoped tracing layer.

pub mod chat;
pub mod config;
pub mod error_handler;
pub mod provider;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use chat::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ResponseFormat, Role, Usage,
};
pub use error_handler::AiLlmError;
pub use provider::{BoxFuture, ChatProvider, EmbeddingProvider};
