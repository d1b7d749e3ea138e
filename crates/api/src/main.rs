use anyhow::Context;

use bazaar_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bazaar_observability::init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(stock_mode = settings.stock_mode.as_str(), "starting bazaar api");

    let app = bazaar_api::app::build_app(&settings)
        .await
        .context("failed to wire services")?;

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
