use tokio::sync::watch;

use visitlog::config::Config;
use visitlog::{build_api_app, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env(5001)?;
    logging::init_tracing(&config.log_level)?;

    let (shutdown_tx, _) = watch::channel(false);
    server::serve(config.http.addr(), build_api_app(), shutdown_tx).await?;
    Ok(())
}
