//! Optional pre-retrieval clarification stage.
//!
//! The orchestrator consults a [`ClarificationStage`] only when one is
//! installed. [`LlmClarifier`] is the model-backed implementation: an analysis
//! request decides whether the question is ambiguous and, if so, a second
//! request proposes search queries.

use ai_llm_service::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::decode::decode_json;
use crate::error::AnswerError;
use crate::llm::{Stage, StageChat};
use crate::model::null_default;
use crate::prompt;

/// Result of asking whether a question needs disambiguation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClarificationOutcome {
    pub need_clarification: bool,
    pub clarifying_question: Option<String>,
    pub missing_slots: Vec<String>,
    pub assumptions: Vec<String>,
    pub suggested_queries: Vec<String>,
}

/// Capability consulted before retrieval.
pub trait ClarificationStage: Send + Sync {
    fn needs_clarification<'a>(
        &'a self,
        question: &'a str,
        dialog_context: &'a str,
    ) -> BoxFuture<'a, Result<ClarificationOutcome, AnswerError>>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Analysis {
    #[serde(default, deserialize_with = "null_default")]
    need_clarification: bool,
    #[serde(default)]
    clarifying_question: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    missing_slots: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    assumptions: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Rewrite {
    #[serde(default, deserialize_with = "null_default")]
    queries: Vec<String>,
}

/// Model-backed clarification: analysis, then query rewrite when needed.
pub struct LlmClarifier {
    chat: StageChat,
    analysis_max_tokens: u32,
    rewrite_max_tokens: u32,
}

impl LlmClarifier {
    pub fn new(chat: StageChat, analysis_max_tokens: u32, rewrite_max_tokens: u32) -> Self {
        Self {
            chat,
            analysis_max_tokens,
            rewrite_max_tokens,
        }
    }

    async fn analyze(&self, question: &str, dialog_context: &str) -> Result<Analysis, AnswerError> {
        let content = self
            .chat
            .complete(
                Stage::Clarification,
                &prompt::analysis_system(),
                &prompt::analysis_user(question, dialog_context),
                self.analysis_max_tokens,
            )
            .await?;
        decode_json(&content).map_err(|e| {
            error!(stage = "clarification", error = %e, "failed to parse clarification response");
            AnswerError::Contract {
                stage: Stage::Clarification,
                source: e,
            }
        })
    }

    async fn rewrite_queries(
        &self,
        question: &str,
        dialog_context: &str,
        analysis: &Analysis,
    ) -> Result<Vec<String>, AnswerError> {
        let analysis_json =
            serde_json::to_string(analysis).map_err(|e| AnswerError::Contract {
                stage: Stage::Rewrite,
                source: e,
            })?;
        let content = self
            .chat
            .complete(
                Stage::Rewrite,
                &prompt::rewrite_system(),
                &prompt::rewrite_user(question, dialog_context, &analysis_json),
                self.rewrite_max_tokens,
            )
            .await?;
        let parsed: Rewrite = decode_json(&content).map_err(|e| {
            error!(stage = "rewrite", error = %e, "failed to parse rewrite response");
            AnswerError::Contract {
                stage: Stage::Rewrite,
                source: e,
            }
        })?;
        Ok(parsed.queries)
    }

    #[instrument(skip_all, fields(stage = "clarification"))]
    async fn run(&self, question: &str, dialog_context: &str) -> Result<ClarificationOutcome, AnswerError> {
        let analysis = self.analyze(question, dialog_context).await?;
        if !analysis.need_clarification {
            return Ok(ClarificationOutcome::default());
        }

        let suggested_queries = self
            .rewrite_queries(question, dialog_context, &analysis)
            .await?;
        info!(
            missing_slots = analysis.missing_slots.len(),
            queries = suggested_queries.len(),
            "clarification requested"
        );

        Ok(ClarificationOutcome {
            need_clarification: true,
            clarifying_question: analysis
                .clarifying_question
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            missing_slots: analysis.missing_slots,
            assumptions: analysis.assumptions,
            suggested_queries,
        })
    }
}

impl ClarificationStage for LlmClarifier {
    fn needs_clarification<'a>(
        &'a self,
        question: &'a str,
        dialog_context: &'a str,
    ) -> BoxFuture<'a, Result<ClarificationOutcome, AnswerError>> {
        Box::pin(self.run(question, dialog_context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;
    use std::sync::Arc;

    fn clarifier(chat: &Arc<ScriptedChat>) -> LlmClarifier {
        LlmClarifier::new(StageChat::new(chat.clone()), 300, 200)
    }

    #[tokio::test]
    async fn clear_question_needs_one_call() {
        let chat = Arc::new(ScriptedChat::new([Ok(
            r#"{"need_clarification":false,"clarifying_question":null,"missing_slots":[],"assumptions":[]}"#.into(),
        )]));
        let out = clarifier(&chat).needs_clarification("What is X?", "").await.unwrap();
        assert_eq!(out, ClarificationOutcome::default());
        assert_eq!(chat.call_count(), 1);
        assert_eq!(chat.requests()[0].max_tokens, Some(300));
    }

    #[tokio::test]
    async fn ambiguous_question_gets_queries() {
        let chat = Arc::new(ScriptedChat::new([
            Ok(r#"{"need_clarification":true,"clarifying_question":" Which version? ","missing_slots":["product_version"],"assumptions":null}"#.into()),
            Ok(r#"{"queries":["install X 1.0","install X 2.0"]}"#.into()),
        ]));
        let out = clarifier(&chat).needs_clarification("How to install?", "").await.unwrap();
        assert!(out.need_clarification);
        assert_eq!(out.clarifying_question.as_deref(), Some("Which version?"));
        assert_eq!(out.missing_slots, vec!["product_version".to_string()]);
        assert!(out.assumptions.is_empty());
        assert_eq!(out.suggested_queries.len(), 2);

        let reqs = chat.requests();
        assert_eq!(reqs[1].max_tokens, Some(200));
        assert!(reqs[1].messages[1].content.contains("\"need_clarification\":true"));
    }

    #[tokio::test]
    async fn bad_analysis_is_contract_violation() {
        let chat = Arc::new(ScriptedChat::new([Ok("maybe".into())]));
        let err = clarifier(&chat).needs_clarification("q", "").await.unwrap_err();
        assert!(matches!(
            err,
            AnswerError::Contract {
                stage: Stage::Clarification,
                ..
            }
        ));
    }
}
