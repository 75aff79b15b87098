//! shelf-importer - Book import microservice
//!
//! Searches external bibliographic sources by ISBN or title/author and
//! imports a chosen result into a library collection.

use anyhow::{Context, Result};
use clap::Parser;
use shelf_common::config::{CompiledDefaults, TomlConfig};
use shelf_common::events::EventBus;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shelf_importer::providers::{build_http_client, OpenLibraryProvider, ProviderRegistry};
use shelf_importer::services::{HttpCoverDownloader, ImportService};
use shelf_importer::types::BookProvider;
use shelf_importer::AppState;

/// Command-line arguments for shelf-importer
#[derive(Parser, Debug)]
#[command(name = "shelf-importer")]
#[command(about = "Book import microservice for Shelf")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SHELF_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "SHELF_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "SHELF_DATABASE")]
    database: Option<PathBuf>,

    /// Directory for downloaded cover images
    #[arg(long, env = "SHELF_IMAGES_DIR")]
    images_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so the log level can come from it
    let config = TomlConfig::load_or_default(args.config.as_deref());
    let defaults = CompiledDefaults::for_current_platform();

    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("shelf_importer={level},shelf_common={level},tower_http={level}").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting shelf-importer v{}", env!("CARGO_PKG_VERSION"));

    let port = args.port.or(config.port).unwrap_or(defaults.port);
    let bind = args
        .bind
        .or(config.bind_address.clone())
        .unwrap_or(defaults.bind_address);
    let database_path = args
        .database
        .or(config.database_path.clone())
        .unwrap_or(defaults.database_path);
    let images_dir = args
        .images_dir
        .or(config.images_dir.clone())
        .unwrap_or(defaults.images_dir);

    info!("Database: {}", database_path.display());
    info!("Images: {}", images_dir.display());

    let db = shelf_common::db::init_database(&database_path)
        .await
        .context("Failed to open database")?;

    let user_agent = config
        .importer
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("shelf-importer/{}", env!("CARGO_PKG_VERSION")));
    let http = build_http_client(
        &user_agent,
        Duration::from_secs(config.importer.request_timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    let providers: Vec<Arc<dyn BookProvider>> = vec![Arc::new(OpenLibraryProvider::new(http.clone()))];
    let registry = Arc::new(ProviderRegistry::new(providers));
    info!("Registered {} importer source(s)", registry.count());

    let event_bus = EventBus::new(100);
    let covers = Arc::new(HttpCoverDownloader::new(
        http,
        db.clone(),
        images_dir,
        event_bus.clone(),
    ));
    let importer = Arc::new(ImportService::new(
        db.clone(),
        event_bus,
        covers,
        config.importer.duplicate_code_guard,
    ));
    info!(guard = ?config.importer.duplicate_code_guard, "Duplicate code guard");

    let state = AppState::new(db, registry, importer);
    let app = shelf_importer::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address {bind}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
