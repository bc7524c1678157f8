use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_anomaly::logic::detector::Detector;
use sentinel_anomaly::{create_router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sentinel_anomaly=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Sentinel anomaly service starting...");
    tracing::info!(environment = %config.environment, model = %config.model_path.display(), "Configuration loaded");

    // Load or create the model
    let model_path = config.model_path.clone();
    let forest_config = config.forest_config();
    let detector = tokio::task::spawn_blocking(move || Detector::initialize(model_path, forest_config))
        .await
        .context("model initialization task failed")?
        .with_context(|| format!("failed to initialize model at {}", config.model_path.display()))?;

    // Build application state
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;
    let state = AppState::new(detector, config);

    // Build router
    let app = create_router(state);

    // Start server
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
