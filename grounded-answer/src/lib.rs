//! Grounded question answering over a vector store.
//!
//! Public API: [`AnswerService::answer`]. It embeds the question, retrieves
//! ranked fragments from a [`rag_store::VectorStore`], asks the model for an
//! answer that cites those fragments, validates the cited claims and, when
//! validation fails, rewrites the answer exactly once.
//!
//! An answer that cannot be grounded is always replaced by [`UNKNOWN_ANSWER`]
//! with no citations.

mod chunks;
mod config;
mod decode;
mod dialog;
mod error;
mod llm;
mod model;
mod pipeline;
mod prompt;
mod retrieval;
pub mod stages;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use chunks::{build_chunks, format_chunks};
pub use config::{DEFAULT_TOP_K, PipelineConfig};
pub use decode::decode_json;
pub use dialog::{append_turn, format_dialog_context, resolve_dialog_context};
pub use error::AnswerError;
pub use llm::{Stage, StageChat};
pub use model::{
    Chunk, Citation, DialogMessage, Request, Response, UNKNOWN_ANSWER, ValidationResult,
};
pub use pipeline::AnswerService;
pub use retrieval::Retriever;
pub use stages::answer::{AnswerDraft, normalize_answer};
pub use stages::clarify::{ClarificationOutcome, ClarificationStage, LlmClarifier};
pub use stages::correct::build_validation_feedback;
