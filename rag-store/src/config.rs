//! Runtime and collection configuration.

use std::str::FromStr;

use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceKind::Cosine),
            "dot" => Ok(DistanceKind::Dot),
            "euclid" | "l2" => Ok(DistanceKind::Euclid),
            other => Err(RagError::Config(format!("unknown distance: {other}"))),
        }
    }
}

/// Configuration for the Qdrant-backed vector store.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Default collection name.
    pub collection: String,
    /// Distance function used when a collection has to be created.
    pub distance: DistanceKind,
    /// Upsert batch size (typical range: 128..512).
    pub upsert_batch: usize,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
}

impl RagConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            upsert_batch: 256,
            exact_search: false,
        }
    }

    /// Builds the config from environment variables with defaults.
    ///
    /// - `QDRANT_URL` (default `http://127.0.0.1:6334`)
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default `documents`)
    /// - `QDRANT_DISTANCE` (`cosine` | `dot` | `euclid`, default `cosine`)
    /// - `QDRANT_BATCH_SIZE` (default 256)
    /// - `RAG_EXACT_SEARCH` (`true` | `false`, default `false`)
    ///
    /// # Errors
    /// Returns `RagError::Config` for an unknown distance or invalid values.
    pub fn from_env() -> Result<Self, RagError> {
        let distance = match env_opt("QDRANT_DISTANCE") {
            Some(d) => d.parse()?,
            None => DistanceKind::Cosine,
        };

        let cfg = Self {
            qdrant_url: env_opt("QDRANT_URL").unwrap_or_else(|| "http://127.0.0.1:6334".into()),
            qdrant_api_key: env_opt("QDRANT_API_KEY"),
            collection: env_opt("QDRANT_COLLECTION").unwrap_or_else(|| "documents".into()),
            distance,
            upsert_batch: env_opt("QDRANT_BATCH_SIZE")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(256),
            exact_search: env_opt("RAG_EXACT_SEARCH").as_deref() == Some("true"),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        Ok(())
    }
}

fn env_opt(k: &str) -> Option<String> {
    std::env::var(k).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = RagConfig::new_default("http://localhost:6334", "docs");
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.distance, DistanceKind::Cosine);
    }

    #[test]
    fn rejects_blank_collection_and_zero_batch() {
        let mut cfg = RagConfig::new_default("http://localhost:6334", "  ");
        assert!(cfg.validate().is_err());
        cfg.collection = "docs".into();
        cfg.upsert_batch = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_distance_names() {
        assert_eq!("L2".parse::<DistanceKind>().unwrap(), DistanceKind::Euclid);
        assert!("manhattan".parse::<DistanceKind>().is_err());
    }
}
