//! Library-scoped tracing layers.
//!
//! Each library in the workspace logs under its own target prefix; the
//! binary composes one [`scoped_layer`] per library on top of a global
//! [`EnvFilter`] so library output can be tuned independently.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix used to filter only library-originated logs.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// Formatting layer that renders ONLY events whose target starts with `prefix`.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line` and target
/// - Span close events (durations of instrumented functions)
/// - ANSI colors only when stdout is a terminal
pub fn scoped_layer<S>(prefix: &'static str) -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();
    let only_prefix = filter::filter_fn(move |meta| meta.target().starts_with(prefix));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_prefix)
}

/// Layer for this crate's own events.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    scoped_layer(TARGET_PREFIX)
}

/// Builds a level directive such as `ai_llm_service=debug`.
///
/// Falls back to the bare level when the target cannot be parsed.
pub fn level_directive(target: &str, level: Level) -> Directive {
    let s = format!("{target}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).unwrap_or_else(|_| Directive::from(level))
}

/// Creates an `EnvFilter` from `RUST_LOG` (or `default`), then applies
/// per-target level directives.
pub fn env_filter_with_levels(default: &str, levels: &[(&str, Level)]) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    levels
        .iter()
        .fold(base, |f, (target, level)| f.add_directive(level_directive(target, *level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_renders_target_and_level() {
        let d = level_directive(TARGET_PREFIX, Level::DEBUG);
        assert_eq!(d.to_string(), "ai_llm_service=debug");
    }
}
