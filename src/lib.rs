//! Catalog Dashboard
//!
//! Server-rendered admin pages for a shop's product catalog: products,
//! categories, collections, attributes, product types and variants.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod forms;
pub mod handlers;
pub mod logging;
pub mod middleware_helpers;
pub mod migrator;
pub mod pagination;
pub mod services;
pub mod tracing;
pub mod uploads;

use axum::{
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, services::ServeDir};

use crate::{
    config::AppConfig, db::DbPool, events::EventSender, logging::LoggingState,
    services::CatalogServices, uploads::ImageStore,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: CatalogServices,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig, event_sender: EventSender) -> Self {
        let db = Arc::new(db);
        let event_sender = Arc::new(event_sender);
        let services = CatalogServices::new(
            db.clone(),
            event_sender.clone(),
            ImageStore::from_config(&config),
        );
        Self {
            db,
            config: Arc::new(config),
            event_sender,
            services,
        }
    }
}

/// The full application: dashboard pages, health probes and static files.
pub fn app_router(state: AppState, logging: Arc<LoggingState>) -> Router {
    let body_limit = state.config.max_body_size;
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard/products") }))
        .nest("/dashboard", handlers::dashboard_routes())
        .nest("/health", handlers::health::health_routes())
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            logging,
            logging::logging_middleware,
        ))
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::errors::ServiceError;
    pub use crate::events::{CatalogEvent, EventSender};
    pub use crate::pagination::Page;
    pub use crate::services::*;
    pub use crate::AppState;
}
