use anyhow::Context;
use tokio::sync::watch;

use visitlog::config::Config;
use visitlog::{build_proxy_app, logging, server, ProxyState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env(5000)?;
    logging::init_tracing(&config.log_level)?;

    let state = ProxyState::new(config.api_url.clone()).context("building http client")?;
    tracing::info!(api_url = %state.api_url, "proxy starting");

    let (shutdown_tx, _) = watch::channel(false);
    server::serve(config.http.addr(), build_proxy_app(state), shutdown_tx).await?;
    Ok(())
}
