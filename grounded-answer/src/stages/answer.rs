//! Answer generation stage and the grounding normalization shared with correction.

use serde::{Deserialize, Serialize};
use tracing::{error, instrument};

use crate::decode::decode_json;
use crate::error::AnswerError;
use crate::llm::{Stage, StageChat};
use crate::model::{Citation, UNKNOWN_ANSWER, null_default};
use crate::prompt;

/// Answer text with its citations, as produced by the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerDraft {
    #[serde(default, deserialize_with = "null_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_default")]
    pub citations_used: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub citations: Vec<Citation>,
}

impl AnswerDraft {
    pub fn unknown() -> Self {
        Self {
            text: UNKNOWN_ANSWER.to_string(),
            ..Default::default()
        }
    }
}

/// Enforces the grounding rules on a parsed draft, in order:
///
/// 1. blank text becomes the sentinel with no citations;
/// 2. the sentinel always loses its citations;
/// 3. a draft missing either citation list becomes the sentinel;
/// 4. anything else is kept as is (with trimmed text).
pub fn normalize_answer(mut draft: AnswerDraft) -> AnswerDraft {
    draft.text = draft.text.trim().to_string();
    if draft.text.is_empty() {
        return AnswerDraft::unknown();
    }
    if draft.text == UNKNOWN_ANSWER {
        draft.citations_used.clear();
        draft.citations.clear();
        return draft;
    }
    if draft.citations_used.is_empty() || draft.citations.is_empty() {
        return AnswerDraft::unknown();
    }
    draft
}

/// Decodes and normalizes model output for an answer-shaped stage.
///
/// A decode failure is a contract violation and is logged with the prompts involved.
pub(crate) fn parse_answer(
    stage: Stage,
    content: &str,
    user_prompt: &str,
    chunks: &str,
    question: &str,
) -> Result<AnswerDraft, AnswerError> {
    match decode_json::<AnswerDraft>(content) {
        Ok(draft) => Ok(normalize_answer(draft)),
        Err(e) => {
            error!(
                stage = stage.as_str(),
                error = %e,
                content,
                user_prompt,
                chunks,
                question,
                "failed to parse answer response"
            );
            Err(AnswerError::Contract { stage, source: e })
        }
    }
}

/// Asks the model for a grounded answer over the rendered `chunks`.
#[instrument(skip_all, fields(stage = "answer"))]
pub async fn generate_answer(
    chat: &StageChat,
    max_tokens: u32,
    question: &str,
    dialog_context: &str,
    chunks: &str,
) -> Result<AnswerDraft, AnswerError> {
    let user_prompt = prompt::answer_user(question, dialog_context, chunks);
    let content = chat
        .complete(Stage::Answer, &prompt::answer_system(), &user_prompt, max_tokens)
        .await?;
    parse_answer(Stage::Answer, &content, &user_prompt, chunks, question)
}
