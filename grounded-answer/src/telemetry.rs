//! Tracing layer scoped to this crate's targets.

use tracing_subscriber::Layer;
use tracing_subscriber::registry::LookupSpan;

/// Target prefix of every event emitted by the pipeline.
pub const TARGET_PREFIX: &str = "grounded_answer";

/// Formatting layer that renders only pipeline events.
///
/// Shares timestamp and line format with the LLM service layer so both read as one log.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    ai_llm_service::telemetry::scoped_layer(TARGET_PREFIX)
}
