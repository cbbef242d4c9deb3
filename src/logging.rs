use tracing_subscriber::EnvFilter;

use crate::config::ConfigError;

/// Install the fmt subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(level: &str) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level = level.trim();
            EnvFilter::try_new(format!("{level},sqlx=warn")).map_err(|e| ConfigError::Invalid {
                key: "LOG_LEVEL",
                reason: e.to_string(),
            })?
        }
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}
