//! Ventilator pressure prediction server

use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ventilator_pressure::{config::Config, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ventilator_pressure=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = Config::from_env();

    tracing::info!("Ventilator pressure server starting ({})", config.environment);
    tracing::info!(
        "Model: {} at {}, upload cap {} MiB, training rows cap {}",
        config.model_kind,
        config.model_path.display(),
        config.max_upload_bytes / (1024 * 1024),
        config.train_sample_limit
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(AppState::new(config));

    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("  POST /api/train                - train a model");
    tracing::info!("  POST /api/predict              - predict pressure");
    tracing::info!("  POST /api/predict_and_download - submission CSV");
    tracing::info!("  GET  /api/load_model           - load saved model");
    tracing::info!("  GET  /api/status               - server status");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
