use tokio::sync::watch;

use visitlog::config::Config;
use visitlog::retry::Shutdown;
use visitlog::{build_db_check_app, logging, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env(5000)?;
    logging::init_tracing(&config.log_level)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::from_config(&config, Shutdown::new(shutdown_rx))?;

    server::serve(config.http.addr(), build_db_check_app(state), shutdown_tx).await?;
    Ok(())
}
