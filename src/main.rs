use anyhow::Context;
use metalworks::{AppState, Catalog, Config, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv {
        tracing::debug!("no .env file loaded: {}", e);
    }

    let config = Config::from_env()?;
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path).with_context(|| format!("Failed to load catalog from {path}"))?,
        None => Catalog::bundled().context("Bundled catalog is invalid")?,
    };
    tracing::info!(
        templates = catalog.templates.len(),
        materials = catalog.materials.len(),
        "catalog loaded"
    );
    if config.email_api_key.is_none() {
        tracing::warn!("EMAIL_API_KEY not set; form submissions will be rejected");
    }

    let bind_addr = config.bind_address.clone();
    let state = AppState::new(config, catalog)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
