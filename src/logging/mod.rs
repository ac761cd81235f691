use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use slog::{o, Drain, Logger};
use slog_async::Async;
use slog_term::{FullFormat, PlainDecorator, TermDecorator};
use std::sync::Arc;
use std::time::Instant;

use crate::tracing::RequestId;

/// Configuration for setting up the access logger
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub async_buffer_size: usize,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            async_buffer_size: 1024,
            use_color: true,
        }
    }
}

/// Sets up the slog access logger. Uncoloured output goes through a plain stdout decorator.
pub fn setup_logger(config: LoggerConfig) -> Logger {
    let root = o!("version" => env!("CARGO_PKG_VERSION"), "component" => "access");

    if config.use_color {
        let decorator = TermDecorator::new().force_color().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = Async::new(drain)
            .chan_size(config.async_buffer_size)
            .build()
            .fuse();
        Logger::root(drain, root)
    } else {
        let decorator = PlainDecorator::new(std::io::stdout());
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = Async::new(drain)
            .chan_size(config.async_buffer_size)
            .build()
            .fuse();
        Logger::root(drain, root)
    }
}

/// State struct for logging middleware
#[derive(Clone)]
pub struct LoggingState {
    logger: Logger,
}

impl LoggingState {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// A logger that drops every record, for tests and embedding.
    pub fn discard() -> Self {
        Self::new(Logger::root(slog::Discard, o!()))
    }
}

/// Access log for dashboard requests. Static assets are logged at debug level.
pub async fn logging_middleware(
    State(state): State<Arc<LoggingState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let response = next.run(req).await;
    let duration_ms: u128 = start_time.elapsed().as_millis();
    let status = response.status().as_u16();

    if path.starts_with("/static/") {
        slog::debug!(
            &state.logger,
            "static asset served";
            "path" => path,
            "status" => status,
        );
    } else {
        slog::info!(
            &state.logger,
            "HTTP request handled";
            "request_id" => request_id,
            "method" => method,
            "path" => path,
            "status" => status,
            "duration_ms" => duration_ms,
        );
    }

    response
}
