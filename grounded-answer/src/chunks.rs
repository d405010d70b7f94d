//! Chunk numbering and prompt rendering.

use rag_store::SearchHit;

use crate::model::Chunk;

/// Maps ranked hits to chunks `C1..Cn`, keeping the store's order.
pub fn build_chunks(hits: Vec<SearchHit>) -> Vec<Chunk> {
    hits.into_iter()
        .enumerate()
        .map(|(i, h)| Chunk {
            id: format!("C{}", i + 1),
            data_source: h.data_source,
            text: h.payload,
        })
        .collect()
}

/// Renders chunks as a stable text block for prompts.
///
/// # Example
/// ```
/// # use grounded_answer::{Chunk, format_chunks};
/// let c = Chunk { id: "C1".into(), data_source: "a.md".into(), text: "body".into() };
/// assert_eq!(format_chunks(&[c]), "[C1]\ndata_source: a.md\ntext: body");
/// assert_eq!(format_chunks(&[]), "");
/// ```
pub fn format_chunks(chunks: &[Chunk]) -> String {
    let mut lines = Vec::with_capacity(chunks.len() * 4);
    for c in chunks {
        lines.push(format!("[{}]", c.id));
        lines.push(format!("data_source: {}", c.data_source));
        lines.push(format!("text: {}", c.text));
        lines.push(String::new());
    }
    lines.join("\n").trim().to_string()
}
