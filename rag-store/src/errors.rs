//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality across items of one upsert.
    #[error("vector size mismatch for item {id}: got {got}, want {want}")]
    VectorSizeMismatch { id: u64, got: usize, want: usize },

    /// An item was upserted without an embedding.
    #[error("empty embedding for item {0}")]
    EmptyEmbedding(u64),

    /// An item was upserted without a data source label.
    #[error("data_source is required for item {0}")]
    MissingDataSource(u64),

    /// A search was issued with an empty query vector.
    #[error("empty query vector")]
    EmptyQueryVector,

    /// A filtered search was issued with a blank data source.
    #[error("data_source is required")]
    DataSourceRequired,

    /// A stored point lacks a payload field every hit must carry.
    #[error("point {id} has no `{key}` payload field")]
    MissingPayloadField { id: u64, key: &'static str },

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}
