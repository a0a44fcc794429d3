//! `pollsd`, the polls identity server binary.
//!
//! Usage:
//!   pollsd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/polls/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod config;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use identity::provider::{FacebookProvider, GoogleProvider, ProviderClient};
use identity::service::IdentityService;
use identity::store::SqliteStore;
use identity::IdentityModule;
use polls_core::Module;

use config::ServerConfig;

/// Polls identity server.
#[derive(Parser, Debug)]
#[command(name = "pollsd", about = "Polls identity server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    server_config.verify()?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let store = Arc::new(
        SqliteStore::open(&data_dir.join("polls.db"))
            .map_err(|e| anyhow::anyhow!("failed to open store: {}", e))?,
    );

    let mut providers: Vec<Arc<dyn ProviderClient>> = Vec::new();
    match server_config.google.clone() {
        Some(google) => {
            providers.push(Arc::new(GoogleProvider::new(google)));
            info!("Google login enabled");
        }
        None => warn!("Google login disabled (no [google] section)"),
    }
    match server_config.facebook.clone() {
        Some(facebook) => {
            providers.push(Arc::new(FacebookProvider::new(facebook)));
            info!("Facebook login enabled");
        }
        None => warn!("Facebook login disabled (no [facebook] section)"),
    }

    let service = IdentityService::new(
        store.clone(),
        store,
        providers,
        server_config.identity_config(),
    );
    let module = IdentityModule::new(service);
    info!("Identity module initialized");

    let app = axum::Router::new()
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .merge(module.routes());

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Polls server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
