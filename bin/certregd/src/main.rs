//! `certregd` — the certification registry server binary.
//!
//! Usage:
//!   certregd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/certreg/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use certreg_core::Module;
use config::ServerConfig;

/// Certification registry server.
#[derive(Parser, Debug)]
#[command(name = "certregd", about = "Certification registry server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides the config file).
    #[arg(long = "listen")]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    let listen = cli
        .listen
        .or_else(|| server_config.listen.clone())
        .unwrap_or_else(|| "0.0.0.0:8080".to_string());

    // Initialize storage.
    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = certreg_core::ServiceConfig {
        data_dir: Some(data_dir),
        sqlite_path: server_config.storage.sqlite_path.clone().map(PathBuf::from),
        media_dir: server_config.storage.media_dir.clone().map(PathBuf::from),
        listen,
    };

    // Badge files referenced by certifications land here.
    std::fs::create_dir_all(core_config.resolve_media_dir())?;

    let sql: Arc<dyn certreg_sql::SQLStore> = Arc::new(
        certreg_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    if server_config.registry.required_certs.is_empty() {
        warn!("no required certifications configured; every certification will classify as extra");
    }

    let registry_service =
        registry::service::RegistryService::new(Arc::clone(&sql), server_config.registry.clone())
            .map_err(|e| anyhow::anyhow!("failed to initialize registry module: {}", e))?;
    let registry_module = registry::RegistryModule::new(registry_service);
    info!("Registry module initialized");

    // Build router.
    let app = routes::build_router(vec![(
        registry_module.name().to_string(),
        registry_module.routes(),
    )]);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("certregd listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
