//! Vector store contract consumed by retrieval code.

use std::{future::Future, pin::Pin};

use crate::errors::RagError;
use crate::record::{SearchHit, VectorItem};

/// Boxed, sendable future returned by [`VectorStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Provider interface for a vector store.
///
/// Implement this trait to plug in your own backend (Qdrant, in-memory, test stubs).
/// The order of `search` results is significant: callers number fragments by rank.
pub trait VectorStore: Send + Sync {
    /// Creates `name` with vectors of size `dim` unless it already exists.
    fn ensure_collection<'a>(&'a self, name: &'a str, dim: usize) -> StoreFuture<'a, ()>;

    /// Inserts or replaces `items`; returns how many points were written.
    fn upsert<'a>(&'a self, collection: &'a str, items: Vec<VectorItem>)
    -> StoreFuture<'a, usize>;

    /// Returns up to `top_k` hits ranked by similarity to `vector`.
    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> StoreFuture<'a, Vec<SearchHit>>;

    /// Same as [`VectorStore::search`], restricted to points with the given `data_source`.
    fn search_by_data_source<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
        data_source: &'a str,
    ) -> StoreFuture<'a, Vec<SearchHit>>;

    /// Releases the store. Later calls fail.
    fn close<'a>(&'a self) -> StoreFuture<'a, ()>;
}

/// Checks an upsert batch before it reaches the backend.
///
/// Every item needs a non-empty embedding and a non-blank `data_source`,
/// and all embeddings must share the dimension of the first item.
pub fn validate_items(items: &[VectorItem]) -> Result<(), RagError> {
    let Some(first) = items.first() else {
        return Ok(());
    };
    let want = first.embedding.len();

    for item in items {
        if item.embedding.is_empty() {
            return Err(RagError::EmptyEmbedding(item.id));
        }
        if item.embedding.len() != want {
            return Err(RagError::VectorSizeMismatch {
                id: item.id,
                got: item.embedding.len(),
                want,
            });
        }
        if item.data_source.trim().is_empty() {
            return Err(RagError::MissingDataSource(item.id));
        }
    }
    Ok(())
}
