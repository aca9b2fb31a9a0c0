use anyhow::Context;

use rollstock_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rollstock_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let app = rollstock_api::app::build_app(&config)
        .await
        .context("failed to initialize roll store")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
