use anyhow::Context;

use stockroom_infra::{StockroomConfig, store};

const DEV_JWT_SECRET: &str = "dev-secret";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config first so a `.env` file can supply RUST_LOG.
    let config = StockroomConfig::from_env().context("failed to load configuration")?;
    stockroom_observability::init();

    let jwt_secret = config.jwt_secret.clone().unwrap_or_else(|| {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
        DEV_JWT_SECRET.to_string()
    });

    let store = store::open(&config)
        .await
        .context("failed to open inventory store")?;

    let app = stockroom_api::app::build_app(jwt_secret, store);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
