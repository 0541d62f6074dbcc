//! Load pool options from `ORM_DB_*` environment variables.

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::str::FromStr;

pub const ENV_HOST: &str = "ORM_DB_HOST";
pub const ENV_PORT: &str = "ORM_DB_PORT";
pub const ENV_USER: &str = "ORM_DB_USER";
pub const ENV_PASSWORD: &str = "ORM_DB_PASSWORD";
pub const ENV_DB: &str = "ORM_DB_NAME";
pub const ENV_CHARSET: &str = "ORM_DB_CHARSET";
pub const ENV_AUTOCOMMIT: &str = "ORM_DB_AUTOCOMMIT";
pub const ENV_MAXSIZE: &str = "ORM_DB_MAXSIZE";
pub const ENV_MINSIZE: &str = "ORM_DB_MINSIZE";

impl PoolConfig {
    /// Read from the process environment. Callers wanting a `.env` file load it first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Same as `from_env` over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |k: &'static str| lookup(k).ok_or(ConfigError::Missing(k));
        let config = PoolConfig {
            host: lookup(ENV_HOST).unwrap_or_else(default_host),
            port: parsed(&lookup, ENV_PORT)?.unwrap_or_else(default_port),
            user: required(ENV_USER)?,
            password: required(ENV_PASSWORD)?,
            db: required(ENV_DB)?,
            charset: lookup(ENV_CHARSET).unwrap_or_else(default_charset),
            autocommit: match lookup(ENV_AUTOCOMMIT) {
                None => true,
                Some(v) => parse_bool(ENV_AUTOCOMMIT, &v)?,
            },
            max_size: parsed(&lookup, ENV_MAXSIZE)?.unwrap_or_else(default_maxsize),
            min_size: parsed(&lookup, ENV_MINSIZE)?.unwrap_or_else(default_minsize),
        };
        validate(&config)?;
        Ok(config)
    }
}

fn parsed<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().parse::<T>().map_err(|_| ConfigError::Invalid { key, value: v }))
        .transpose()
}

fn parse_bool(key: &'static str, v: &str) -> Result<bool, ConfigError> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: v.to_string(),
        }),
    }
}
