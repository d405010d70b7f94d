//! Claim validation stage.
//!
//! Fails closed: a bad validator response becomes `ok = false` instead of an error.
//! Only a failed chat call propagates.

use tracing::{instrument, warn};

use crate::decode::decode_json;
use crate::error::AnswerError;
use crate::llm::{Stage, StageChat};
use crate::model::{UNKNOWN_ANSWER, ValidationResult};
use crate::prompt;

pub const NOTE_EMPTY_ANSWER: &str = "empty answer text";
pub const NOTE_UNKNOWN_SKIPPED: &str = "validation skipped for unknown answer";
pub const NOTE_EMPTY_RESPONSE: &str = "empty validator response";
pub const NOTE_INVALID_RESPONSE: &str = "invalid validator response";

/// Checks that every specific claim in `answer_text` is backed by `chunks`.
#[instrument(skip_all, fields(stage = "validation"))]
pub async fn validate_answer(
    chat: &StageChat,
    max_tokens: u32,
    question: &str,
    answer_text: &str,
    chunks: &str,
) -> Result<ValidationResult, AnswerError> {
    let trimmed = answer_text.trim();
    if trimmed.is_empty() {
        warn!("skip validation: empty answer text");
        return Ok(ValidationResult::verdict(false, NOTE_EMPTY_ANSWER));
    }
    if trimmed == UNKNOWN_ANSWER {
        return Ok(ValidationResult::verdict(true, NOTE_UNKNOWN_SKIPPED));
    }

    let user_prompt = prompt::validation_user(question, answer_text, chunks);
    let content = chat
        .complete(
            Stage::Validation,
            &prompt::validation_system(),
            &user_prompt,
            max_tokens,
        )
        .await?;

    let content = content.trim();
    if content.is_empty() {
        warn!("validation returned empty response");
        return Ok(ValidationResult::verdict(false, NOTE_EMPTY_RESPONSE));
    }

    match decode_json::<ValidationResult>(content) {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!(
                error = %e,
                content,
                user_prompt = %user_prompt,
                chunks,
                question,
                answer_text,
                "failed to parse validation response"
            );
            Ok(ValidationResult::verdict(false, NOTE_INVALID_RESPONSE))
        }
    }
}
