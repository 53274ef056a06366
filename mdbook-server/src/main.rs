//! mdbook Server - JSON API for writing books

use anyhow::{Context, Result};
use mdbook_server::config::Settings;
use mdbook_server::{routes, state};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::from_env().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if settings.development {
        tracing::warn!("Development mode");
    }
    let addr = settings.addr;
    let state = state::AppState::new(settings)?;
    let app = routes::create_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
