//! Logging setup (tracing/tracing-subscriber).
//!
//! - COACH_LOG sets the filter, e.g. "debug" or "info,coach=debug".
//! - COACH_LOG_FORMAT=json switches to structured JSON lines.
//!
//! Logs go to stderr so the board and JSON results on stdout stay clean.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("COACH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match std::env::var("COACH_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
