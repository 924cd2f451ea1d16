use anyhow::Context;

use shelfwise_api::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shelfwise_observability::init();

    let config = ApiConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    let app = shelfwise_api::app::build_app(config)
        .await
        .context("failed to initialise services")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
