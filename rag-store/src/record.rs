//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Payload key holding the stored text fragment.
pub const PAYLOAD_TEXT_KEY: &str = "payload";
/// Payload key holding the origin label of a fragment.
pub const PAYLOAD_SOURCE_KEY: &str = "data_source";

/// One point to upsert: id, dense vector, stored text and its origin label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorItem {
    pub id: u64,
    pub embedding: Vec<f32>,
    pub payload: String,
    pub data_source: String,
}

/// A single ranked search hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub score: f32,
    pub payload: String,
    pub data_source: String,
}
