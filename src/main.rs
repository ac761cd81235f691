use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};

use catalog_dashboard as app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = app::config::load_config().context("failed to load configuration")?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);
    app::handlers::health::init_start_time();

    let db_pool = app::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        app::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }

    tokio::fs::create_dir_all(cfg.upload_path())
        .await
        .with_context(|| format!("failed to create upload directory {}", cfg.upload_path().display()))?;

    let (event_sender, event_rx) = app::events::EventSender::channel(cfg.event_channel_capacity);
    let events = tokio::spawn(app::events::process_events(event_rx));

    let access_log = app::logging::setup_logger(app::logging::LoggerConfig::default());
    let logging = Arc::new(app::logging::LoggingState::new(access_log));

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.host, cfg.port))?;

    let state = app::AppState::new(db_pool, cfg, event_sender);
    let db = state.db.clone();
    let router = app::app_router(state, logging);

    info!("catalog-dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the last senders; the event loop finishes once they are gone.
    if let Err(err) = events.await {
        error!("Event processor ended abnormally: {}", err);
    }
    if let Ok(pool) = Arc::try_unwrap(db) {
        app::db::close_pool(pool).await?;
    }
    info!("catalog-dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
