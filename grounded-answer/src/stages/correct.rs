//! One-shot answer correction driven by validator feedback.

use serde::Serialize;
use tracing::instrument;

use crate::error::AnswerError;
use crate::llm::{Stage, StageChat};
use crate::model::ValidationResult;
use crate::prompt;
use crate::stages::answer::{AnswerDraft, parse_answer};

#[derive(Serialize)]
struct Feedback<'a> {
    notes: &'a str,
    unsupported_claims: &'a [String],
}

/// Compact JSON of the validator's notes and unsupported claims.
///
/// Falls back to the notes, then to `"no feedback"`, if serialization fails.
pub fn build_validation_feedback(validation: &ValidationResult) -> String {
    let payload = Feedback {
        notes: validation.notes.trim(),
        unsupported_claims: &validation.unsupported_claims,
    };
    match serde_json::to_string(&payload) {
        Ok(s) => s,
        Err(_) if !payload.notes.is_empty() => payload.notes.to_string(),
        Err(_) => "no feedback".to_string(),
    }
}

/// Rewrites `answer_text` once, using the validator's remarks.
#[instrument(skip_all, fields(stage = "answer_rewrite"))]
pub async fn rewrite_answer(
    chat: &StageChat,
    max_tokens: u32,
    question: &str,
    dialog_context: &str,
    chunks: &str,
    answer_text: &str,
    validation: &ValidationResult,
) -> Result<AnswerDraft, AnswerError> {
    let feedback = build_validation_feedback(validation);
    let user_prompt =
        prompt::answer_rewrite_user(question, dialog_context, chunks, answer_text, &feedback);
    let content = chat
        .complete(
            Stage::AnswerRewrite,
            &prompt::answer_rewrite_system(),
            &user_prompt,
            max_tokens,
        )
        .await?;
    parse_answer(Stage::AnswerRewrite, &content, &user_prompt, chunks, question)
}
