//! Pool options as accepted by `create_pool`; deserializable from JSON with per-key defaults.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub db: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_true")]
    pub autocommit: bool,
    #[serde(default = "default_maxsize", rename = "maxsize", alias = "max_size")]
    pub max_size: u32,
    #[serde(default = "default_minsize", rename = "minsize", alias = "min_size")]
    pub min_size: u32,
}

impl PoolConfig {
    /// Required options only; the rest take their defaults.
    pub fn new(user: impl Into<String>, password: impl Into<String>, db: impl Into<String>) -> Self {
        PoolConfig {
            host: default_host(),
            port: default_port(),
            user: user.into(),
            password: password.into(),
            db: db.into(),
            charset: default_charset(),
            autocommit: true,
            max_size: default_maxsize(),
            min_size: default_minsize(),
        }
    }
}

pub(crate) fn default_host() -> String {
    "localhost".into()
}

pub(crate) fn default_port() -> u16 {
    3306
}

pub(crate) fn default_charset() -> String {
    "utf8".into()
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_maxsize() -> u32 {
    10
}

pub(crate) fn default_minsize() -> u32 {
    1
}
