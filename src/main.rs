use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};

use pdfshelf::{Config, Database, FileRepository, FileService, FileStorage, WebServer};

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = pdfshelf::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        pdfshelf::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("pdfshelf stopped with an error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> pdfshelf::Result<()> {
    config.validate()?;

    info!("pdfshelf - PDF upload and viewing service");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = Database::open(&config.database.path).await?;
    let storage = FileStorage::new(&config.files.storage_path)?;
    info!("File storage initialized at: {}", config.files.storage_path);

    let files = FileService::new(
        Arc::new(storage),
        Arc::new(FileRepository::new(db.pool().clone())),
        config.files.max_upload_bytes(),
    );

    if config.files.sweep_orphans_on_startup {
        match files.sweep_orphans().await {
            Ok(0) => info!("No orphaned binaries found"),
            Ok(count) => info!(removed = count, "Removed orphaned binaries"),
            Err(e) => warn!("Orphan sweep failed: {}", e),
        }
    }

    let server = WebServer::new(&config.server, files)?;
    let result = server.run_until(shutdown_signal()).await;

    db.close().await;
    result?;

    info!("pdfshelf shut down");
    Ok(())
}

/// Resolve when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
