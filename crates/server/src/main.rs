//! `deck-server` entry point: loads `.env`, reads the config and serves the router.

use anyhow::Context;
use deck_server::config::Config;
use deck_server::{create_app, storage, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let store = storage::from_config(&config.storage).await;
    log::info!("Reading presentations from {}", store.describe());

    let app = create_app(AppState::new(store));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    log::info!("PM Agent backend listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
