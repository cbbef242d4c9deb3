use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("invalid database url: {0}")]
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, ConfigError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(ConfigError::Url(format!("unsupported scheme '{other}'"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl HttpConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

const MIN_CONNECT_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Full connection URL; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "db".to_string(),
            port: 5432,
            database: "visits".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(1),
        }
    }
}

impl StoreConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| ConfigError::Url(e.to_string()))?;
        url.set_host(Some(&self.host))
            .map_err(|e| ConfigError::Url(format!("host '{}': {e}", self.host)))?;
        url.set_port(Some(self.port))
            .map_err(|_| ConfigError::Url("cannot set port".into()))?;
        url.set_username(&self.user)
            .map_err(|_| ConfigError::Url("cannot set user".into()))?;
        url.set_password(Some(&self.password))
            .map_err(|_| ConfigError::Url("cannot set password".into()))?;
        url.set_path(&self.database);

        Ok(url.into())
    }

    pub fn dialect(&self) -> Result<Dialect, ConfigError> {
        Dialect::from_url(&self.connection_url()?)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpConfig,
    pub store: StoreConfig,
    pub retry: RetryPolicy,
    pub api_url: String,
    pub log_level: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env(default_port: u16) -> Result<Self, ConfigError> {
        Self::from_lookup(default_port, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(default_port: u16, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_defaults = StoreConfig::default();
        let retry_defaults = RetryPolicy::default();

        let http = HttpConfig {
            host: parse_or(&lookup, "HTTP_HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&lookup, "HTTP_PORT", default_port)?,
        };

        let backoff: f64 = parse_or(&lookup, "RETRY_BACKOFF", retry_defaults.multiplier)?;
        if !backoff.is_finite() || backoff < 1.0 {
            return Err(ConfigError::Invalid {
                key: "RETRY_BACKOFF",
                reason: format!("{backoff} is below 1.0"),
            });
        }
        let max_attempts: u32 = parse_or(&lookup, "RETRY_MAX_ATTEMPTS", 0)?;
        let retry = RetryPolicy {
            initial_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_INTERVAL_MS",
                retry_defaults.initial_delay.as_millis() as u64,
            )?),
            multiplier: backoff,
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                "RETRY_MAX_INTERVAL_MS",
                retry_defaults.max_delay.as_millis() as u64,
            )?),
            max_attempts: (max_attempts > 0).then_some(max_attempts),
        };

        // One outer attempt covers sqlx's own reconnects until the acquire
        // timeout, so keep it within a retry interval by default.
        let default_connect_timeout = retry.initial_delay.max(MIN_CONNECT_TIMEOUT);

        let store = StoreConfig {
            url: non_empty(&lookup, "DATABASE_URL"),
            host: non_empty(&lookup, "DB_HOST").unwrap_or(store_defaults.host),
            port: parse_or(&lookup, "DB_PORT", store_defaults.port)?,
            database: non_empty(&lookup, "DB_NAME").unwrap_or(store_defaults.database),
            user: non_empty(&lookup, "DB_USER").unwrap_or(store_defaults.user),
            password: lookup("DB_PASSWORD").unwrap_or(store_defaults.password),
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", store_defaults.max_connections)?,
            connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_MS",
                default_connect_timeout.as_millis() as u64,
            )?),
        };
        if store.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                reason: "must be at least 1".into(),
            });
        }

        let config = Config {
            http,
            store,
            retry,
            api_url: non_empty(&lookup, "API_URL").unwrap_or_else(|| "http://api:5001".to_string()),
            log_level: non_empty(&lookup, "LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };

        // Fail at startup rather than on the first request.
        config.store.dialect()?;

        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("'{raw}': {e}"),
        }),
    }
}
