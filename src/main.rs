use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use vaultguard::config::AuthConfig;
use vaultguard::services::RsaKeyPair;
use vaultguard::store::{
    MemoryDeviceStore, MemoryGrantStore, MemoryMembershipStore, MemoryUserStore,
};
use vaultguard::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AuthConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        "starting vault auth core"
    );

    let keys = RsaKeyPair::load_or_generate(
        Path::new(&config.private_key_path),
        Path::new(&config.public_key_path),
    )?;
    tracing::info!("RSA keypair ready");

    let state = AppState::new(
        config.clone(),
        &keys,
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryDeviceStore::new()),
        Arc::new(MemoryMembershipStore::new()),
        Arc::new(MemoryGrantStore::new()),
    );

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
