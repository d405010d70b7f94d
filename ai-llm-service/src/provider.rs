//! Provider contracts consumed by the answer pipeline.
//!
//! Implement these traits to plug in your own backend (OpenAI, Ollama,
//! local models, test stubs). Async is required because real providers
//! perform HTTP requests; dropping the returned future abandons the call.

use std::{future::Future, pin::Pin};

use crate::chat::{ChatCompletionRequest, ChatCompletionResponse};
use crate::error_handler::AiLlmError;

/// Boxed, sendable future returned by provider methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chat completion backend.
pub trait ChatProvider: Send + Sync {
    /// Runs one non-streaming completion.
    ///
    /// Implementations must fail on an empty `messages` list and on a
    /// provider answer without any choice.
    fn create_chat_completion<'a>(
        &'a self,
        req: ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<ChatCompletionResponse, AiLlmError>>;
}

/// Embedding backend.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every input text; output order matches input order.
    fn create_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>>;
}
