//! Hand-written collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use ai_llm_service::error_handler::{Provider, ProviderError, ProviderErrorKind};
use ai_llm_service::{
    AiLlmError, BoxFuture, ChatCompletionRequest, ChatCompletionResponse, ChatProvider,
    EmbeddingProvider, Role,
};
use rag_store::{RagError, SearchHit, StoreFuture, VectorItem, VectorStore};

use crate::model::Citation;

pub fn chat_failure() -> AiLlmError {
    AiLlmError::Provider(ProviderError::new(
        Provider::OpenAI,
        ProviderErrorKind::EmptyChoices,
    ))
}

pub fn hit(data_source: &str, text: &str) -> SearchHit {
    SearchHit {
        id: 0,
        score: 0.5,
        payload: text.to_string(),
        data_source: data_source.to_string(),
    }
}

pub fn citation(id: &str) -> Citation {
    Citation {
        id: id.to_string(),
        data_source: "a.md".to_string(),
        quote: "quoted".to_string(),
    }
}

/// Chat provider that replays scripted replies in order and records every request.
///
/// Running out of script is reported as a provider failure.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, AiLlmError>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: impl IntoIterator<Item = Result<String, AiLlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// System prompts of every request, in call order.
    pub fn system_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.messages[0].content.clone())
            .collect()
    }
}

impl ChatProvider for ScriptedChat {
    fn create_chat_completion<'a>(
        &'a self,
        req: ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<ChatCompletionResponse, AiLlmError>> {
        self.requests.lock().unwrap().push(req);
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(chat_failure()));
        Box::pin(async move {
            next.map(|content| ChatCompletionResponse {
                content,
                role: Role::Assistant,
                finish_reason: "stop".to_string(),
                ..Default::default()
            })
        })
    }
}

/// Chat provider that never answers. Used for deadline and cancellation tests.
pub struct PendingChat;

impl ChatProvider for PendingChat {
    fn create_chat_completion<'a>(
        &'a self,
        _req: ChatCompletionRequest,
    ) -> BoxFuture<'a, Result<ChatCompletionResponse, AiLlmError>> {
        Box::pin(std::future::pending())
    }
}

/// Embedding provider returning a fixed vector list.
pub struct StubEmbedder {
    vectors: Vec<Vec<f32>>,
    inputs: Mutex<Vec<Vec<String>>>,
}

impl StubEmbedder {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self {
            vectors,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<Vec<String>> {
        self.inputs.lock().unwrap().clone()
    }
}

impl EmbeddingProvider for StubEmbedder {
    fn create_embeddings<'a>(
        &'a self,
        texts: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<Vec<f32>>, AiLlmError>> {
        self.inputs.lock().unwrap().push(texts.to_vec());
        let out = self.vectors.clone();
        Box::pin(async move { Ok(out) })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchCall {
    pub collection: String,
    pub vector: Vec<f32>,
    pub top_k: u64,
}

/// Vector store returning fixed hits and recording searches.
pub struct StubStore {
    hits: Vec<SearchHit>,
    fail: bool,
    calls: Mutex<Vec<SearchCall>>,
}

impl StubStore {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<SearchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, collection: &str, vector: Vec<f32>, top_k: u64) -> Result<Vec<SearchHit>, RagError> {
        self.calls.lock().unwrap().push(SearchCall {
            collection: collection.to_string(),
            vector,
            top_k,
        });
        if self.fail {
            return Err(RagError::Qdrant("search unavailable".into()));
        }
        Ok(self.hits.iter().take(top_k as usize).cloned().collect())
    }
}

impl VectorStore for StubStore {
    fn ensure_collection<'a>(&'a self, _name: &'a str, _dim: usize) -> StoreFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn upsert<'a>(&'a self, _collection: &'a str, items: Vec<VectorItem>) -> StoreFuture<'a, usize> {
        Box::pin(async move { Ok(items.len()) })
    }

    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> StoreFuture<'a, Vec<SearchHit>> {
        let res = self.record(collection, vector, top_k);
        Box::pin(async move { res })
    }

    fn search_by_data_source<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
        data_source: &'a str,
    ) -> StoreFuture<'a, Vec<SearchHit>> {
        let res = self.record(collection, vector, top_k).map(|hits| {
            hits.into_iter()
                .filter(|h| h.data_source == data_source)
                .collect()
        });
        Box::pin(async move { res })
    }

    fn close<'a>(&'a self) -> StoreFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }
}
