pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod retry;
pub mod routes;
pub mod server;

use std::time::Duration;

use axum::{routing::get, Router};
use sqlx::AnyPool;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{Config, Dialect};
use crate::db::PoolError;
use crate::retry::{RetryPolicy, Shutdown};

#[derive(Clone)]
pub struct AppState {
    pub db: AnyPool,
    pub dialect: Dialect,
    pub retry: RetryPolicy,
    pub shutdown: Shutdown,
}

impl AppState {
    /// Lazily connected pool plus the retry settings from `config`.
    pub fn from_config(config: &Config, shutdown: Shutdown) -> Result<Self, PoolError> {
        Ok(Self {
            db: db::init_pool(&config.store)?,
            dialect: config.store.dialect()?,
            retry: config.retry.clone(),
            shutdown,
        })
    }
}

#[derive(Clone)]
pub struct ProxyState {
    pub client: reqwest::Client,
    pub api_url: String,
}

impl ProxyState {
    pub fn new(api_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

async fn health() -> &'static str {
    "ok"
}

fn with_common_layers(router: Router) -> Router {
    router.route("/health", get(health)).layer(
        TraceLayer::new_for_http()
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// Visit logger: records a visit per request and lists them all.
///
/// The visit table is created on first request, so no migration step is needed.
pub fn build_app(state: AppState) -> Router {
    with_common_layers(routes::visits::router().with_state(state))
}

/// Static greeting service the proxy talks to.
pub fn build_api_app() -> Router {
    with_common_layers(routes::hello::router())
}

pub fn build_proxy_app(state: ProxyState) -> Router {
    with_common_layers(routes::proxy::router().with_state(state))
}

/// Reports whether the store accepts connections.
pub fn build_db_check_app(state: AppState) -> Router {
    with_common_layers(routes::db_check::router().with_state(state))
}
