//! Stage-level chat wrapper: one `(system, user)` prompt pair in, raw text out.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::{ChatCompletionRequest, ChatMessage, ChatProvider, ResponseFormat};
use tracing::{debug, error, info};

use crate::error::AnswerError;

/// Pipeline step that issued a chat request. Used in logs and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Answer,
    AnswerRewrite,
    Validation,
    Clarification,
    Rewrite,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Answer => "answer",
            Stage::AnswerRewrite => "answer_rewrite",
            Stage::Validation => "validation",
            Stage::Clarification => "clarification",
            Stage::Rewrite => "rewrite",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared chat handle used by every prompt stage.
///
/// Requests always go out with temperature 0 and a JSON-object response format.
#[derive(Clone)]
pub struct StageChat {
    provider: Arc<dyn ChatProvider>,
}

impl StageChat {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self { provider }
    }

    /// Sends one structured request and returns the assistant content.
    ///
    /// # Errors
    /// Returns [`AnswerError::Llm`] when the provider fails.
    pub async fn complete(
        &self,
        stage: Stage,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AnswerError> {
        let req = ChatCompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: Some(0.0),
            max_tokens: Some(max_tokens),
            top_p: None,
            response_format: Some(ResponseFormat::JsonObject),
        };

        debug!(stage = stage.as_str(), max_tokens, "chat request");
        let started = Instant::now();
        match self.provider.create_chat_completion(req).await {
            Ok(resp) => {
                info!(
                    stage = stage.as_str(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    finish_reason = %resp.finish_reason,
                    total_tokens = resp.usage.total_tokens,
                    "chat completed"
                );
                Ok(resp.content)
            }
            Err(e) => {
                error!(stage = stage.as_str(), error = %e, "chat request failed");
                Err(AnswerError::Llm(e))
            }
        }
    }
}
