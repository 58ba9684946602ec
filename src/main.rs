use std::sync::Arc;

use rideshare_notify::{config::AppConfig, router, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!(
        store = ?config.store_backend,
        gateway = ?config.push_gateway,
        fallback_language = %config.fallback_language,
        "Starting notification service"
    );

    let address = config.bind_address();
    let app_state = AppState::new(config)?;
    let app = router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);
    axum::serve(listener, app).await?;

    Ok(())
}
