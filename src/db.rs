use sqlx::any::{AnyPoolOptions, install_default_drivers};
use sqlx::pool::PoolConnection;
use sqlx::{Any, AnyPool};

use crate::config::{ConfigError, StoreConfig};
use crate::retry::{ConnectError, RetryPolicy, Shutdown, connect_with_retry};

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot build connection pool: {0}")]
    Pool(#[from] sqlx::Error),
}

/// Build the store pool without connecting.
///
/// Connections are opened on first acquire, so the service can start while the
/// store is still coming up.
pub fn init_pool(config: &StoreConfig) -> Result<AnyPool, PoolError> {
    install_default_drivers();

    let url = config.connection_url()?;
    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.connect_timeout)
        .connect_lazy(&url)?;

    Ok(pool)
}

/// Check a connection out of the pool, waiting for the store per `policy`.
///
/// The returned guard goes back to the pool when dropped, on every path.
pub async fn acquire(
    pool: &AnyPool,
    policy: &RetryPolicy,
    shutdown: &Shutdown,
) -> Result<PoolConnection<Any>, ConnectError> {
    connect_with_retry(policy, shutdown, || pool.acquire()).await
}

/// Single connectivity probe, no retries.
pub async fn ping(pool: &AnyPool) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    sqlx::query("SELECT 1").execute(&mut *conn).await?;
    Ok(())
}
