use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

mod api;
mod config;
mod db;
mod error;
mod extraction;
mod service;
mod views;

use crate::db::Database;
use crate::service::SyllabusService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!(
        "Starting syllabus service v{}",
        env!("CARGO_PKG_VERSION")
    );

    let static_config = Arc::new(config::load_config()?);

    info!(
        host = %static_config.server.host,
        port = static_config.server.port,
        "Configuration loaded"
    );

    // Ensure data directory exists
    std::fs::create_dir_all(&static_config.storage.data_dir)?;

    // Initialize database (shared with the extraction script)
    let db_path = static_config.storage.db_path();
    let db = Arc::new(Database::open(&db_path)?);
    info!(path = %db_path.display(), "Database initialized");

    if !static_config.extractor.script.exists() {
        warn!(
            script = %static_config.extractor.script.display(),
            "Extraction script not found; uploads will fail until it is in place"
        );
    }

    let service = Arc::new(SyllabusService::new(db, static_config.clone()));

    let app = api::router(service);

    let addr = format!(
        "{}:{}",
        static_config.server.host, static_config.server.port
    );
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("syllabus_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
