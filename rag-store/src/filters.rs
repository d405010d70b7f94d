//! Filter construction for Qdrant searches.

use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, condition::ConditionOneOf, r#match::MatchValue,
};
use tracing::debug;

use crate::errors::RagError;
use crate::record::PAYLOAD_SOURCE_KEY;

/// Builds a filter that keeps only points whose `data_source` equals the
/// trimmed `data_source`.
///
/// # Errors
/// [`RagError::DataSourceRequired`] when `data_source` is blank.
pub fn data_source_filter(data_source: &str) -> Result<Filter, RagError> {
    let data_source = data_source.trim();
    if data_source.is_empty() {
        return Err(RagError::DataSourceRequired);
    }
    debug!("filters::data_source_filter data_source={data_source}");

    let cond = Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: PAYLOAD_SOURCE_KEY.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(data_source.to_string())),
            }),
            ..Default::default()
        })),
    };

    Ok(Filter {
        must: vec![cond],
        ..Default::default()
    })
}
