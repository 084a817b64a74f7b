//! Community event server.
//!
//! Serves the event engine over HTTP with PostgreSQL-backed event storage
//! and currency ledger.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use nest_events::{
    event::EventManager,
    ledger::PgLedger,
    store::{PgEventStore, postgres::connect_pool},
};
use nest_server::{api, config::ServerConfig, logging, metrics};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the community event server

USAGE:
  nest_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/nest_events]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  ADMIN_TOKEN              Shared secret for admin commands (required, 16+ chars)
  METRICS_BIND             Prometheus exporter address (optional)
  RUST_LOG                 Log filter (default: info,sqlx=warn,hyper=warn)
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url_override: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind_override, database_url_override)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on {}", metrics_bind);
    }

    info!("Connecting to database");
    let pool = connect_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    let pool = Arc::new(pool);

    let store = PgEventStore::new(pool.clone());
    store
        .migrate()
        .await
        .context("Failed to prepare event store schema")?;

    let ledger = PgLedger::new(pool);
    ledger
        .migrate()
        .await
        .context("Failed to prepare ledger schema")?;

    info!("Database connected successfully");

    let event_manager = Arc::new(EventManager::new(Arc::new(store), Arc::new(ledger)));

    let state = api::AppState {
        event_manager,
        admin_token: Arc::from(config.admin_token.as_str()),
        event_defaults: config.event_defaults,
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
