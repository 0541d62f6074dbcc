//! Pool option sanity checks, run before any connection is opened.

use crate::config::PoolConfig;
use crate::error::ConfigError;

pub fn validate(config: &PoolConfig) -> Result<(), ConfigError> {
    for (key, value) in [("user", &config.user), ("db", &config.db)] {
        if value.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key,
                value: value.clone(),
            });
        }
    }
    if config.max_size == 0 {
        return Err(ConfigError::Invalid {
            key: "maxsize",
            value: config.max_size.to_string(),
        });
    }
    if config.min_size > config.max_size {
        return Err(ConfigError::Invalid {
            key: "minsize",
            value: format!("{} (maxsize {})", config.min_size, config.max_size),
        });
    }
    Ok(())
}
