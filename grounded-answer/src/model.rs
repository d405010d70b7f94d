//! Request/response types of the answer pipeline.
//!
//! Everything here is built per request and owned by the returned [`Response`].

use ai_llm_service::Role;
use serde::{Deserialize, Deserializer, Serialize};

/// Fixed fallback answer used whenever no fragment supports an answer.
pub const UNKNOWN_ANSWER: &str = "I don't know based on the provided sources.";

/// One prior conversation turn supplied by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogMessage {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

impl DialogMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A single user turn.
///
/// # Example
/// ```
/// use grounded_answer::Request;
/// let req = Request::new("What is X?").with_top_k(4);
/// assert_eq!(req.top_k, 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub question: String,
    #[serde(default)]
    pub history: Vec<DialogMessage>,
    /// Pre-rendered dialog context. Takes precedence over `history` when non-blank.
    #[serde(default)]
    pub dialog_context: Option<String>,
    /// Number of chunks to retrieve. `0` uses the configured default.
    #[serde(default)]
    pub top_k: u64,
}

impl Request {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_history(mut self, history: Vec<DialogMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_dialog_context(mut self, ctx: impl Into<String>) -> Self {
        self.dialog_context = Some(ctx.into());
        self
    }
}

/// Ranked fragment offered to the model, identified as `C1`, `C2`, ...
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub data_source: String,
    pub text: String,
}

/// Claim-to-chunk attribution produced by the model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, deserialize_with = "null_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub data_source: String,
    #[serde(default, deserialize_with = "null_default")]
    pub quote: String,
}

/// Outcome of the claim validation stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default, deserialize_with = "null_default")]
    pub ok: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub unsupported_claims: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub notes: String,
}

impl ValidationResult {
    pub(crate) fn verdict(ok: bool, notes: &str) -> Self {
        Self {
            ok,
            unsupported_claims: Vec::new(),
            notes: notes.to_string(),
        }
    }
}

/// Final result of one `answer` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub answer: String,
    pub citations_used: Vec<String>,
    pub citations: Vec<Citation>,
    pub chunks: Vec<Chunk>,
    pub validation: ValidationResult,

    /// Set only when a clarification stage is installed and asked for one.
    pub need_clarification: bool,
    pub clarifying_question: Option<String>,
    pub missing_slots: Vec<String>,
    pub assumptions: Vec<String>,
    pub suggested_queries: Vec<String>,
}

impl Response {
    /// True when the answer is the fallback sentinel.
    pub fn is_unknown(&self) -> bool {
        self.answer == UNKNOWN_ANSWER
    }
}

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_tolerates_nulls_and_missing_fields() {
        let v: ValidationResult =
            serde_json::from_str(r#"{"ok": true, "unsupported_claims": null}"#).unwrap();
        assert!(v.ok);
        assert!(v.unsupported_claims.is_empty());
        assert!(v.notes.is_empty());
    }

    #[test]
    fn citation_defaults_missing_quote() {
        let c: Citation = serde_json::from_str(r#"{"id":"C2","data_source":"a.md"}"#).unwrap();
        assert_eq!(c.id, "C2");
        assert_eq!(c.quote, "");
    }

    #[test]
    fn dialog_message_role_defaults_to_user() {
        let m: DialogMessage = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(m.role, Role::User);
    }
}
