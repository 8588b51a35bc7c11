use std::path::PathBuf;

use anyhow::Context;

use guildhall_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::var_os("GUILDHALL_CONFIG").map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("failed to load configuration")?;

    guildhall_observability::init(&config.logging);

    let state = guildhall_api::app::build_state(&config)
        .await
        .context("failed to build application state")?;
    let app = guildhall_api::app::build_app(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
