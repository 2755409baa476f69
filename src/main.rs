//! Entry point: load config, wire dependencies, and run the server.

use pushgate::config::Config;
use pushgate::repositories::RedisRepository;
use pushgate::{create_app, AppState, BroadcastGateway, BroadcastSettings};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let gateway = BroadcastGateway::from_config(&config)?;
    let redis = RedisRepository::new(&config.redis_url)?;
    let settings = BroadcastSettings::new(&config.credentials, &config.target, config.timeout);

    let state = AppState {
        broadcaster: Arc::new(gateway),
        redis,
        settings,
        api_key: config.api_key.clone(),
        static_dir: config.static_dir.clone(),
    };
    if state.api_key.is_none() {
        tracing::warn!("BROADCAST_API_KEY unset; POST /api/broadcast rejects all callers");
    }

    let app = create_app(state);

    tracing::info!(
        addr = %config.server_addr,
        upstream = %config.target.base_url(),
        app_id = %config.credentials.app_id(),
        "listening"
    );
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
