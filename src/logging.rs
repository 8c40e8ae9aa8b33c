//!
//! src/logging.rs
//!
//! Initializes the tracing subscriber so the translator gives
//! informative structured output while running
//!

use tracing_appender::non_blocking;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::errors::TranslateError;

/// Keeps the non-blocking writer alive; drop flushes pending output.
pub struct LoggingGuard(#[allow(dead_code)] tracing_appender::non_blocking::WorkerGuard);

pub fn init_logging(cfg: &LoggingConfig) -> Result<LoggingGuard, TranslateError> {
    let (writer, guard) = non_blocking(std::io::stdout());
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(cfg.filter_directives.clone()));

    let time = fmt::time::UtcTime::rfc_3339();
    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_timer(time)
        .with_ansi(cfg.with_ansi)
        .with_target(cfg.include_target)
        .with_file(cfg.include_file_line)
        .with_line_number(cfg.include_file_line);

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    match cfg.format {
        LogFormat::Json => registry
            .with(fmt_layer.json().flatten_event(true).with_current_span(true))
            .init(),
        LogFormat::Pretty => registry.with(fmt_layer).init(),
    }

    Ok(LoggingGuard(guard))
}
