//! Retrieval gateway: embed the question, search the store, number the hits.

use std::sync::Arc;
use std::time::Instant;

use ai_llm_service::EmbeddingProvider;
use rag_store::VectorStore;
use tracing::{debug, error, info};

use crate::chunks::build_chunks;
use crate::error::AnswerError;
use crate::model::Chunk;

pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
    default_top_k: u64,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
        default_top_k: u64,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
            default_top_k,
        }
    }

    /// Returns chunks `C1..Cn` for `question` in the store's rank order.
    ///
    /// `top_k == 0` uses the configured default.
    ///
    /// # Errors
    /// - [`AnswerError::Llm`] if embedding fails
    /// - [`AnswerError::EmptyEmbeddings`] if the provider returned no vector or an empty one
    /// - [`AnswerError::Store`] if the search fails
    pub async fn fetch_chunks(&self, question: &str, top_k: u64) -> Result<Vec<Chunk>, AnswerError> {
        let top_k = if top_k > 0 { top_k } else { self.default_top_k };
        let started = Instant::now();

        let input = [question.to_string()];
        let vectors = self.embedder.create_embeddings(&input).await.map_err(|e| {
            error!(error = %e, "failed to create embeddings");
            AnswerError::Llm(e)
        })?;
        let Some(vector) = vectors.into_iter().next().filter(|v| !v.is_empty()) else {
            return Err(AnswerError::EmptyEmbeddings);
        };
        debug!(dim = vector.len(), "question embedded");

        let hits = self
            .store
            .search(&self.collection, vector, top_k)
            .await
            .map_err(|e| {
                error!(error = %e, collection = %self.collection, "failed to search chunks");
                AnswerError::Store(e)
            })?;

        let chunks = build_chunks(hits);
        info!(
            top_k,
            hits = chunks.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "retrieval completed"
        );
        Ok(chunks)
    }
}
