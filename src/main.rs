use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

mod config;
mod controllers;
mod db;
mod error;
mod models;
mod routers;
mod state;

use config::Config;
use models::song::load_fixture;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().context("invalid configuration")?;

    let songs = load_fixture(&config.fixture_path)?;
    let store = db::open_store(&config.store)
        .await
        .context("failed to connect to the song store")?;
    store
        .replace_all(&songs)
        .await
        .context("failed to seed the song collection")?;
    info!(
        "📀 Seeded {} songs from {}",
        songs.len(),
        config.fixture_path.display()
    );

    let app = routers::app(AppState::new(store, config.api_mode));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    info!("🎵 Song catalog listening on {}", listener.local_addr()?);
    info!("📡 Status codes: {:?} mode", config.api_mode);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Song catalog shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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
    info!("Shutdown signal received");
}
