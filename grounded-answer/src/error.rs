//! Typed error for the grounded answer pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::llm::Stage;

#[derive(Debug, Error)]
pub enum AnswerError {
    /// The question was blank after trimming. No collaborator was called.
    #[error("[Grounded Answer] question is empty")]
    EmptyQuestion,

    /// The embedding provider answered with zero vectors.
    #[error("[Grounded Answer] empty embeddings")]
    EmptyEmbeddings,

    /// Chat or embedding provider failure.
    #[error("[Grounded Answer] llm error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// Vector store failure.
    #[error("[Grounded Answer] store error: {0}")]
    Store(#[from] rag_store::RagError),

    /// Model output did not parse as the JSON shape the stage requires.
    #[error("[Grounded Answer] contract violation in stage {stage}: {source}")]
    Contract {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    /// The configured per-request deadline elapsed.
    #[error("[Grounded Answer] request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request.
    #[error("[Grounded Answer] request cancelled")]
    Cancelled,
}
