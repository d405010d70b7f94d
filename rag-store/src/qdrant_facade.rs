//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind a minimal API,
//! hiding away the verbose builder pattern and keeping the rest of the
//! application decoupled from `qdrant-client`.

use std::collections::HashMap;

use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, Filter, PointStruct, ScoredPoint, SearchParamsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
    point_id::PointIdOptions, value::Kind,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::json;
use tracing::{debug, info};

use crate::config::{DistanceKind, RagConfig};
use crate::errors::RagError;
use crate::record::{PAYLOAD_SOURCE_KEY, PAYLOAD_TEXT_KEY, SearchHit, VectorItem};

/// A facade over the Qdrant client.
pub struct QdrantFacade {
    client: Qdrant,
    distance: DistanceKind,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// Uses the builder-based API of `qdrant-client` and supports optional
    /// API key authentication.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(format!("client build: {e}")))?;

        Ok(Self {
            client,
            distance: cfg.distance,
        })
    }

    /// Ensures that `collection` exists.
    ///
    /// - If the collection already exists → no-op.
    /// - If missing → creates it with `dim` and the configured distance.
    pub async fn ensure_collection(&self, collection: &str, dim: usize) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(collection)
            .await
            .map_err(|e| RagError::Qdrant(format!("collection_exists: {e}")))?;
        if exists {
            debug!("Collection '{collection}' already exists");
            return Ok(());
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        info!(
            "Creating collection '{}' with size={} distance={:?}",
            collection, dim, self.distance
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, distance)),
            )
            .await
            .map_err(|e| RagError::Qdrant(format!("create_collection: {e}")))?;

        Ok(())
    }

    /// Upserts one batch of already validated items.
    pub async fn upsert_points(
        &self,
        collection: &str,
        items: Vec<VectorItem>,
    ) -> Result<usize, RagError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut points = Vec::with_capacity(items.len());
        for item in items {
            let payload: Payload = json!({
                PAYLOAD_TEXT_KEY: item.payload,
                PAYLOAD_SOURCE_KEY: item.data_source,
            })
            .try_into()
            .map_err(|e| RagError::Qdrant(format!("payload convert: {e}")))?;
            points.push(PointStruct::new(item.id, item.embedding, payload));
        }

        let n = points.len();
        info!("Upserting {n} points into collection '{collection}'");
        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| RagError::Qdrant(format!("upsert_points: {e}")))?;

        Ok(n)
    }

    /// Performs a similarity search and returns hits in Qdrant's rank order.
    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
        exact: bool,
    ) -> Result<Vec<SearchHit>, RagError> {
        debug!(
            "Searching in '{}' with top_k={}, filtered={}, exact={}",
            collection,
            top_k,
            filter.is_some(),
            exact
        );

        let mut builder = SearchPointsBuilder::new(collection, vector, top_k).with_payload(true);
        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::Qdrant(format!("search_points: {e}")))?;

        let hits = res
            .result
            .into_iter()
            .map(scored_point_to_hit)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Search completed: {} hits returned", hits.len());
        Ok(hits)
    }
}

/// Maps a `ScoredPoint` into a [`SearchHit`].
///
/// Both `payload` and `data_source` must be present on the point.
fn scored_point_to_hit(sp: ScoredPoint) -> Result<SearchHit, RagError> {
    let id = match sp.id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Num(n)) => n,
        _ => 0,
    };
    Ok(SearchHit {
        id,
        score: sp.score,
        payload: payload_str(&sp.payload, id, PAYLOAD_TEXT_KEY)?,
        data_source: payload_str(&sp.payload, id, PAYLOAD_SOURCE_KEY)?,
    })
}

fn payload_str(
    p: &HashMap<String, QValue>,
    id: u64,
    key: &'static str,
) -> Result<String, RagError> {
    let value = match p.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        Some(Kind::IntegerValue(i)) => i.to_string(),
        Some(Kind::DoubleValue(f)) => f.to_string(),
        Some(Kind::BoolValue(b)) => b.to_string(),
        _ => return Err(RagError::MissingPayloadField { id, key }),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::PointId;

    fn sval(s: &str) -> QValue {
        QValue {
            kind: Some(Kind::StringValue(s.to_string())),
        }
    }

    #[test]
    fn maps_payload_fields_and_numeric_id() {
        let mut payload = HashMap::new();
        payload.insert("payload".to_string(), sval("fragment text"));
        payload.insert("data_source".to_string(), sval("manual.md"));
        let sp = ScoredPoint {
            id: Some(PointId {
                point_id_options: Some(PointIdOptions::Num(42)),
            }),
            payload,
            score: 0.87,
            ..Default::default()
        };
        let hit = scored_point_to_hit(sp).unwrap();
        assert_eq!(hit.id, 42);
        assert_eq!(hit.payload, "fragment text");
        assert_eq!(hit.data_source, "manual.md");
        assert!((hit.score - 0.87).abs() < f32::EPSILON);
    }

    #[test]
    fn point_without_payload_is_an_error() {
        let err = scored_point_to_hit(ScoredPoint::default()).unwrap_err();
        assert!(matches!(
            err,
            RagError::MissingPayloadField { id: 0, key: "payload" }
        ));
    }

    #[test]
    fn point_without_data_source_is_an_error() {
        let mut payload = HashMap::new();
        payload.insert("payload".to_string(), sval("fragment text"));
        let sp = ScoredPoint {
            id: Some(PointId {
                point_id_options: Some(PointIdOptions::Num(7)),
            }),
            payload,
            ..Default::default()
        };
        let err = scored_point_to_hit(sp).unwrap_err();
        assert!(matches!(
            err,
            RagError::MissingPayloadField { id: 7, key: "data_source" }
        ));
    }
}
