//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL carries the filter directives, e.g. "debug" or
//!   "info,pipeline=trace,course_forge=debug,tower_http=info".
//! - LOG_FORMAT=json switches to structured JSON lines; anything else is the
//!   human-readable format.
//!
//! Targets used in this crate: `course_forge` (process + endpoints) and
//! `pipeline` (model responses and per-unit outcomes).

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,course_forge=debug,pipeline=debug,tower_http=info,axum=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

fn log_format(value: Option<&str>) -> LogFormat {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Pretty,
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two builders have different types, so finish each branch separately.
    match log_format(std::env::var("LOG_FORMAT").ok().as_deref()) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
