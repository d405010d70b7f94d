//! Vector store facade over Qdrant.
//!
//! This crate provides:
//! - The [`VectorStore`] contract used by retrieval code
//! - [`RagStore`], its Qdrant-backed implementation (collection lifecycle,
//!   batched upsert, ranked search, search filtered by `data_source`)
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod config;
mod errors;
mod filters;
mod qdrant_facade;
mod record;
mod store;

pub use config::{DistanceKind, RagConfig};
pub use errors::RagError;
pub use record::{PAYLOAD_SOURCE_KEY, PAYLOAD_TEXT_KEY, SearchHit, VectorItem};
pub use store::{StoreFuture, VectorStore, validate_items};

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, trace};

/// High-level facade that wires configuration and Qdrant client.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    client: qdrant_facade::QdrantFacade,
    closed: AtomicBool,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` if the configuration is invalid or the client
    /// cannot be built.
    pub fn new(cfg: RagConfig) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self {
            cfg,
            client,
            closed: AtomicBool::new(false),
        })
    }

    /// Default collection configured for this store.
    pub fn collection(&self) -> &str {
        &self.cfg.collection
    }

    fn ensure_open(&self) -> Result<(), RagError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RagError::Config("store is closed".into()));
        }
        Ok(())
    }

    async fn upsert_batched(
        &self,
        collection: &str,
        items: Vec<VectorItem>,
    ) -> Result<usize, RagError> {
        self.ensure_open()?;
        validate_items(&items)?;

        let batch = self.cfg.upsert_batch.max(1);
        let mut written = 0usize;
        let mut rest = items;
        while !rest.is_empty() {
            let tail = rest.split_off(batch.min(rest.len()));
            written += self.client.upsert_points(collection, rest).await?;
            rest = tail;
        }

        info!("RagStore::upsert collection={collection} written={written}");
        Ok(written)
    }
}

impl VectorStore for RagStore {
    fn ensure_collection<'a>(&'a self, name: &'a str, dim: usize) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.ensure_open()?;
            if dim == 0 {
                return Err(RagError::Config("vector dimension must be > 0".into()));
            }
            self.client.ensure_collection(name, dim).await
        })
    }

    fn upsert<'a>(
        &'a self,
        collection: &'a str,
        items: Vec<VectorItem>,
    ) -> StoreFuture<'a, usize> {
        Box::pin(self.upsert_batched(collection, items))
    }

    fn search<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
    ) -> StoreFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            self.ensure_open()?;
            if vector.is_empty() {
                return Err(RagError::EmptyQueryVector);
            }
            debug!("RagStore::search collection={collection} top_k={top_k}");
            self.client
                .search(collection, vector, top_k, None, self.cfg.exact_search)
                .await
        })
    }

    fn search_by_data_source<'a>(
        &'a self,
        collection: &'a str,
        vector: Vec<f32>,
        top_k: u64,
        data_source: &'a str,
    ) -> StoreFuture<'a, Vec<SearchHit>> {
        Box::pin(async move {
            self.ensure_open()?;
            if vector.is_empty() {
                return Err(RagError::EmptyQueryVector);
            }
            let filter = filters::data_source_filter(data_source)?;
            debug!(
                "RagStore::search_by_data_source collection={collection} top_k={top_k} data_source={}",
                data_source.trim()
            );
            self.client
                .search(collection, vector, top_k, Some(filter), self.cfg.exact_search)
                .await
        })
    }

    fn close<'a>(&'a self) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            if !self.closed.swap(true, Ordering::AcqRel) {
                info!("RagStore::close collection={}", self.cfg.collection);
            }
            Ok(())
        })
    }
}
