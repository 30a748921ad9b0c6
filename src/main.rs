mod config;
mod credentials;
mod encoder;
mod error;
mod gallery;
mod gemini;
mod models;
mod narrative;
mod orchestrator;
mod presets;
mod prompt;
mod routes;
#[cfg(test)]
mod testing;
mod video;

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::StudioConfig;
use crate::gemini::GeminiClientFactory;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = StudioConfig::from_env();
    match &config.default_api_key {
        Some(key) => tracing::info!("Using default API key: {}...", credentials::Credential::new(key.as_str()).preview()),
        None => tracing::info!("No default API key, requests must send {}", routes::API_KEY_HEADER),
    }

    let factory = GeminiClientFactory::new(config.api_base.clone(), config.http_timeout)
        .context("building Gemini HTTP client")?;
    let state = AppState::new(&config, Arc::new(factory));

    let app = router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, image_model = %config.models.image, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("🛑 Shutting down");
}
