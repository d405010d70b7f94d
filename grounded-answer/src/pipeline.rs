//! Orchestrator: retrieval, answer, validation and at most one correction.

use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::{ChatProvider, EmbeddingProvider};
use rag_store::VectorStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::chunks::format_chunks;
use crate::config::PipelineConfig;
use crate::dialog::resolve_dialog_context;
use crate::error::AnswerError;
use crate::llm::StageChat;
use crate::model::{Request, Response, UNKNOWN_ANSWER, ValidationResult};
use crate::retrieval::Retriever;
use crate::stages::answer::generate_answer;
use crate::stages::clarify::{ClarificationOutcome, ClarificationStage, LlmClarifier};
use crate::stages::correct::rewrite_answer;
use crate::stages::validate::validate_answer;

const NOTE_CLARIFICATION: &str = "validation skipped for clarification request";

/// Grounded question answering over a vector store.
///
/// Holds only immutable configuration and shared collaborator handles, so one
/// instance can serve any number of concurrent callers.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use grounded_answer::{AnswerService, PipelineConfig, Request};
/// # async fn demo(
/// #     chat: Arc<dyn ai_llm_service::ChatProvider>,
/// #     embedder: Arc<dyn ai_llm_service::EmbeddingProvider>,
/// #     store: Arc<dyn rag_store::VectorStore>,
/// # ) -> Result<(), grounded_answer::AnswerError> {
/// let svc = AnswerService::new(PipelineConfig::new("docs", 6), chat, embedder, store);
/// let resp = svc.answer(&Request::new("What is X?")).await?;
/// println!("{} ({} citations)", resp.answer, resp.citations.len());
/// # Ok(()) }
/// ```
pub struct AnswerService {
    cfg: PipelineConfig,
    chat: StageChat,
    retriever: Retriever,
    clarifier: Option<Arc<dyn ClarificationStage>>,
}

impl AnswerService {
    pub fn new(
        cfg: PipelineConfig,
        chat: Arc<dyn ChatProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let retriever = Retriever::new(embedder, store, cfg.collection.clone(), cfg.default_top_k);
        Self {
            cfg,
            chat: StageChat::new(chat),
            retriever,
            clarifier: None,
        }
    }

    /// Installs a clarification stage consulted before retrieval.
    pub fn with_clarification(mut self, stage: Arc<dyn ClarificationStage>) -> Self {
        self.clarifier = Some(stage);
        self
    }

    /// Installs the model-backed [`LlmClarifier`] using this service's chat provider.
    pub fn with_llm_clarifier(self) -> Self {
        let stage = LlmClarifier::new(
            self.chat.clone(),
            self.cfg.analysis_max_tokens,
            self.cfg.rewrite_max_tokens,
        );
        self.with_clarification(Arc::new(stage))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    /// Answers one user turn.
    ///
    /// Applies the configured deadline, if any.
    ///
    /// # Errors
    /// - [`AnswerError::EmptyQuestion`] before any collaborator call
    /// - provider, store and contract errors from the stages
    /// - [`AnswerError::Timeout`] when the deadline elapses
    pub async fn answer(&self, req: &Request) -> Result<Response, AnswerError> {
        let Some(deadline) = self.cfg.deadline else {
            return self.run(req).await;
        };
        match tokio::time::timeout(deadline, self.run(req)).await {
            Ok(res) => res,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "answer deadline elapsed");
                Err(AnswerError::Timeout(deadline))
            }
        }
    }

    /// Same as [`AnswerService::answer`], abandoned as soon as `cancel` fires.
    ///
    /// No partial response is returned on cancellation.
    pub async fn answer_with_cancel(
        &self,
        req: &Request,
        cancel: &CancellationToken,
    ) -> Result<Response, AnswerError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("answer cancelled by caller");
                Err(AnswerError::Cancelled)
            }
            res = self.answer(req) => res,
        }
    }

    #[instrument(skip_all, fields(top_k = req.top_k))]
    async fn run(&self, req: &Request) -> Result<Response, AnswerError> {
        let started = Instant::now();

        let question = req.question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }
        let dialog_context = resolve_dialog_context(req);
        debug!(
            question_len = question.len(),
            context_len = dialog_context.len(),
            "request accepted"
        );

        if let Some(clarifier) = &self.clarifier {
            let outcome = clarifier
                .needs_clarification(question, &dialog_context)
                .await?;
            if outcome.need_clarification {
                info!(
                    latency_ms = started.elapsed().as_millis() as u64,
                    "returning clarification request"
                );
                return Ok(clarification_response(outcome));
            }
        }

        let chunks = self.retriever.fetch_chunks(question, req.top_k).await?;
        let chunks_text = format_chunks(&chunks);

        let draft = generate_answer(
            &self.chat,
            self.cfg.answer_max_tokens,
            question,
            &dialog_context,
            &chunks_text,
        )
        .await?;

        let mut resp = Response {
            answer: draft.text.trim().to_string(),
            citations_used: draft.citations_used,
            citations: draft.citations,
            chunks,
            ..Default::default()
        };

        let validation = validate_answer(
            &self.chat,
            self.cfg.validation_max_tokens,
            question,
            &resp.answer,
            &chunks_text,
        )
        .await?;

        if !validation.ok {
            info!(
                unsupported = validation.unsupported_claims.len(),
                notes = %validation.notes,
                "validation failed, rewriting answer once"
            );
            let corrected = rewrite_answer(
                &self.chat,
                self.cfg.answer_max_tokens,
                question,
                &dialog_context,
                &chunks_text,
                &resp.answer,
                &validation,
            )
            .await?;
            resp.answer = corrected.text.trim().to_string();
            resp.citations_used = corrected.citations_used;
            resp.citations = corrected.citations;
        }
        resp.validation = validation;

        info!(
            chunks = resp.chunks.len(),
            citations = resp.citations.len(),
            unknown = resp.is_unknown(),
            validation_ok = resp.validation.ok,
            latency_ms = started.elapsed().as_millis() as u64,
            "answer completed"
        );
        Ok(resp)
    }
}

fn clarification_response(outcome: ClarificationOutcome) -> Response {
    Response {
        answer: UNKNOWN_ANSWER.to_string(),
        validation: ValidationResult::verdict(true, NOTE_CLARIFICATION),
        need_clarification: true,
        clarifying_question: outcome.clarifying_question,
        missing_slots: outcome.missing_slots,
        assumptions: outcome.assumptions,
        suggested_queries: outcome.suggested_queries,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use ai_llm_service::BoxFuture;

    use crate::prompt;
    use crate::stages::validate::NOTE_UNKNOWN_SKIPPED;
    use crate::testing::{PendingChat, ScriptedChat, StubEmbedder, StubStore, chat_failure, hit};

    const GROUNDED: &str = r#"{"text":"X is Y [C1]","citations_used":["C1"],"citations":[{"id":"C1","data_source":"a.md","quote":"X is Y"}]}"#;
    const CORRECTED: &str = r#"{"text":"X is Z [C2]","citations_used":["C2"],"citations":[{"id":"C2","data_source":"b.md","quote":"X is Z"}]}"#;
    const VALID: &str = r#"{"ok":true,"unsupported_claims":[],"notes":""}"#;
    const INVALID: &str = r#"{"ok":false,"unsupported_claims":["claim1"],"notes":"not supported"}"#;

    struct Fixture {
        chat: Arc<ScriptedChat>,
        embedder: Arc<StubEmbedder>,
        store: Arc<StubStore>,
    }

    impl Fixture {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                chat: Arc::new(ScriptedChat::new(
                    replies.into_iter().map(|r| Ok(r.to_string())),
                )),
                embedder: Arc::new(StubEmbedder::new(vec![vec![0.1, 0.2, 0.3]])),
                store: Arc::new(StubStore::new(vec![
                    hit("a.md", "X is Y"),
                    hit("b.md", "X is Z"),
                ])),
            }
        }

        fn service(&self) -> AnswerService {
            AnswerService::new(
                PipelineConfig::new("docs", 6),
                self.chat.clone(),
                self.embedder.clone(),
                self.store.clone(),
            )
        }
    }

    fn assert_grounding_invariants(resp: &Response) {
        if resp.is_unknown() {
            assert!(resp.citations_used.is_empty());
            assert!(resp.citations.is_empty());
        } else {
            assert!(!resp.citations_used.is_empty());
            assert!(!resp.citations.is_empty());
        }
    }

    #[tokio::test]
    async fn validated_answer_is_returned_without_correction() {
        let fx = Fixture::new(vec![GROUNDED, VALID]);
        let resp = fx.service().answer(&Request::new("What is X?")).await.unwrap();

        assert_eq!(resp.answer, "X is Y [C1]");
        assert!(resp.validation.ok);
        assert_eq!(resp.citations_used, vec!["C1".to_string()]);
        let ids: Vec<_> = resp.chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["C1", "C2"]);
        assert_grounding_invariants(&resp);

        assert_eq!(fx.chat.call_count(), 2);
        assert_eq!(
            fx.chat.system_prompts(),
            vec![prompt::answer_system(), prompt::validation_system()]
        );
    }

    #[tokio::test]
    async fn failed_validation_triggers_exactly_one_correction() {
        let fx = Fixture::new(vec![GROUNDED, INVALID, CORRECTED]);
        let resp = fx.service().answer(&Request::new("What is X?")).await.unwrap();

        assert_eq!(resp.answer, "X is Z [C2]");
        assert_eq!(resp.citations_used, vec!["C2".to_string()]);
        assert_eq!(resp.citations[0].data_source, "b.md");
        assert!(!resp.validation.ok);
        assert_eq!(resp.validation.unsupported_claims, vec!["claim1".to_string()]);
        assert_grounding_invariants(&resp);

        assert_eq!(
            fx.chat.system_prompts(),
            vec![
                prompt::answer_system(),
                prompt::validation_system(),
                prompt::answer_rewrite_system(),
            ]
        );
        let rewrite_user = &fx.chat.requests()[2].messages[1].content;
        assert!(rewrite_user.contains("X is Y [C1]"));
        assert!(rewrite_user.contains("claim1"));
    }

    #[tokio::test]
    async fn ungrounded_correction_still_replaces_answer() {
        let fx = Fixture::new(vec![
            GROUNDED,
            INVALID,
            r#"{"text":"X is Z","citations_used":[],"citations":[]}"#,
        ]);
        let resp = fx.service().answer(&Request::new("What is X?")).await.unwrap();
        assert_eq!(resp.answer, UNKNOWN_ANSWER);
        assert_grounding_invariants(&resp);
        assert_eq!(fx.chat.call_count(), 3);
    }

    #[tokio::test]
    async fn empty_embeddings_abort_before_any_chat() {
        let fx = Fixture {
            embedder: Arc::new(StubEmbedder::new(vec![])),
            ..Fixture::new(vec![GROUNDED, VALID])
        };
        let err = fx.service().answer(&Request::new("What is X?")).await.unwrap_err();
        assert!(matches!(err, AnswerError::EmptyEmbeddings));
        assert_eq!(fx.chat.call_count(), 0);
        assert!(fx.store.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_question_touches_nothing() {
        let fx = Fixture::new(vec![]);
        let err = fx.service().answer(&Request::new("  \n ")).await.unwrap_err();
        assert!(matches!(err, AnswerError::EmptyQuestion));
        assert!(fx.embedder.inputs().is_empty());
        assert!(fx.store.calls().is_empty());
        assert_eq!(fx.chat.call_count(), 0);
    }

    #[tokio::test]
    async fn sentinel_answer_skips_validator_call() {
        let sentinel = format!(
            r#"{{"text":"{UNKNOWN_ANSWER}","citations_used":["C1"],"citations":[]}}"#
        );
        let fx = Fixture::new(vec![sentinel.as_str()]);
        let resp = fx.service().answer(&Request::new("What is W?")).await.unwrap();
        assert!(resp.is_unknown());
        assert!(resp.validation.ok);
        assert_eq!(resp.validation.notes, NOTE_UNKNOWN_SKIPPED);
        assert_grounding_invariants(&resp);
        assert_eq!(fx.chat.call_count(), 1);
    }

    #[tokio::test]
    async fn malformed_generation_is_fatal() {
        let fx = Fixture::new(vec!["I think X is Y."]);
        let err = fx.service().answer(&Request::new("What is X?")).await.unwrap_err();
        assert!(matches!(err, AnswerError::Contract { .. }));
    }

    #[tokio::test]
    async fn garbage_validator_output_fails_closed_into_correction() {
        let fx = Fixture::new(vec![GROUNDED, "definitely fine", CORRECTED]);
        let resp = fx.service().answer(&Request::new("What is X?")).await.unwrap();
        assert_eq!(resp.answer, "X is Z [C2]");
        assert!(!resp.validation.ok);
        assert_eq!(fx.chat.call_count(), 3);
    }

    #[tokio::test]
    async fn validator_transport_error_propagates() {
        let fx = Fixture {
            chat: Arc::new(ScriptedChat::new([Ok(GROUNDED.to_string()), Err(chat_failure())])),
            ..Fixture::new(vec![])
        };
        let err = fx.service().answer(&Request::new("What is X?")).await.unwrap_err();
        assert!(matches!(err, AnswerError::Llm(_)));
    }

    #[tokio::test]
    async fn request_top_k_and_dialog_context_reach_collaborators() {
        let fx = Fixture::new(vec![GROUNDED, VALID]);
        let req = Request::new("And X?")
            .with_top_k(1)
            .with_history(vec![crate::DialogMessage::new(
                ai_llm_service::Role::User,
                "tell me about X",
            )]);
        let resp = fx.service().answer(&req).await.unwrap();
        assert_eq!(resp.chunks.len(), 1);
        assert_eq!(fx.store.calls()[0].top_k, 1);
        let answer_user = &fx.chat.requests()[0].messages[1].content;
        assert!(answer_user.contains("Dialog context: user: tell me about X"));
    }

    struct AlwaysAmbiguous;

    impl ClarificationStage for AlwaysAmbiguous {
        fn needs_clarification<'a>(
            &'a self,
            _question: &'a str,
            _dialog_context: &'a str,
        ) -> BoxFuture<'a, Result<ClarificationOutcome, AnswerError>> {
            Box::pin(async {
                Ok(ClarificationOutcome {
                    need_clarification: true,
                    clarifying_question: Some("Which X?".into()),
                    missing_slots: vec!["entity".into()],
                    assumptions: vec![],
                    suggested_queries: vec!["X definition".into()],
                })
            })
        }
    }

    #[tokio::test]
    async fn clarification_short_circuits_retrieval() {
        let fx = Fixture::new(vec![]);
        let svc = fx.service().with_clarification(Arc::new(AlwaysAmbiguous));
        let resp = svc.answer(&Request::new("What is X?")).await.unwrap();

        assert!(resp.need_clarification);
        assert_eq!(resp.clarifying_question.as_deref(), Some("Which X?"));
        assert_eq!(resp.suggested_queries, vec!["X definition".to_string()]);
        assert!(resp.chunks.is_empty());
        assert_grounding_invariants(&resp);
        assert!(fx.store.calls().is_empty());
        assert_eq!(fx.chat.call_count(), 0);
    }

    #[tokio::test]
    async fn llm_clarifier_passes_through_when_not_needed() {
        let fx = Fixture::new(vec![
            r#"{"need_clarification":false,"clarifying_question":null,"missing_slots":[],"assumptions":[]}"#,
            GROUNDED,
            VALID,
        ]);
        let resp = fx
            .service()
            .with_llm_clarifier()
            .answer(&Request::new("What is X?"))
            .await
            .unwrap();
        assert_eq!(resp.answer, "X is Y [C1]");
        assert!(!resp.need_clarification);
        assert_eq!(fx.chat.call_count(), 3);
    }

    fn stalled_service(deadline: Option<Duration>) -> AnswerService {
        let mut cfg = PipelineConfig::new("docs", 6);
        cfg.deadline = deadline;
        AnswerService::new(
            cfg,
            Arc::new(PendingChat),
            Arc::new(StubEmbedder::new(vec![vec![1.0]])),
            Arc::new(StubStore::new(vec![hit("a.md", "X is Y")])),
        )
    }

    #[tokio::test]
    async fn deadline_turns_into_timeout_error() {
        let svc = stalled_service(Some(Duration::from_millis(20)));
        let err = svc.answer(&Request::new("What is X?")).await.unwrap_err();
        assert!(matches!(err, AnswerError::Timeout(d) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn cancellation_abandons_the_pipeline() {
        let svc = stalled_service(None);
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });
        let err = svc
            .answer_with_cancel(&Request::new("What is X?"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Cancelled));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_service() {
        // Each reply decodes both as an answer and as a passing verdict.
        let both = r#"{"text":"X is Y [C1]","citations_used":["C1"],"citations":[{"id":"C1","data_source":"a.md","quote":"X is Y"}],"ok":true,"unsupported_claims":[],"notes":""}"#;
        let fx = Fixture::new(vec![both; 4]);
        let svc = Arc::new(fx.service());
        let (req_a, req_b) = (Request::new("What is X?"), Request::new("What is X again?"));
        let (a, b) = tokio::join!(svc.answer(&req_a), svc.answer(&req_b));
        assert_eq!(a.unwrap().answer, "X is Y [C1]");
        assert_eq!(b.unwrap().answer, "X is Y [C1]");
        assert_eq!(fx.store.calls().len(), 2);
    }
}
