use anyhow::{Context, Result};
use packet_secrets::api::{create_app, AdminAppState, EngineAppState};
use packet_secrets::backend::Backend;
use packet_secrets::config::{load_config, new_lease_config, ServerConfig, StorageBackend};
use packet_secrets::remote::PacketClientFactory;
use packet_secrets::storage::{InmemStorage, SqliteStorage, Storage};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "packet_secrets=info".into()),
        )
        .init();

    info!("Packet secrets engine starting...");

    let config_path = std::env::var("PACKET_SECRETS_CONFIG")
        .unwrap_or_else(|_| "packet-secrets.toml".to_string());

    let config = if Path::new(&config_path).exists() {
        load_config(&config_path)?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults");
        ServerConfig::default()
    };

    let seal_key = std::env::var("PACKET_SECRETS_SEAL_KEY").ok();
    let root_token = std::env::var("PACKET_SECRETS_ROOT_TOKEN").ok();

    info!(
        listen = %config.server.listen,
        storage = ?config.storage.backend,
        base_url = %config.remote.base_url,
        sealed = seal_key.is_some(),
        root_token_required = root_token.is_some(),
        "Configuration loaded"
    );

    let storage: Arc<dyn Storage> = match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory storage, roles and config are lost on restart");
            Arc::new(InmemStorage::new())
        }
        StorageBackend::Sqlite => match &seal_key {
            Some(key) => Arc::new(
                SqliteStorage::with_seal(
                    &config.storage.path,
                    key,
                    config.storage.sealed_keys.clone(),
                )
                .context("Failed to initialize sealed storage")?,
            ),
            None => {
                warn!("PACKET_SECRETS_SEAL_KEY not set, config is stored unencrypted");
                Arc::new(
                    SqliteStorage::new(&config.storage.path)
                        .context("Failed to initialize storage")?,
                )
            }
        },
    };
    info!("Storage initialized");

    let lease_config = new_lease_config(config.lease.clone().with_env_overrides());
    let factory = Arc::new(PacketClientFactory::new(
        config.remote.base_url.clone(),
        config.remote.user_agent.clone(),
    ));
    let backend = Arc::new(Backend::new(storage, factory, lease_config.clone()));

    let app = create_app(
        EngineAppState::new(backend, root_token.clone()),
        AdminAppState {
            lease_config,
            root_token,
        },
    );

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    info!(addr = %config.server.listen, "HTTP API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Packet secrets engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
