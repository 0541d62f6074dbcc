//! Typed errors for schema registration, configuration, records and queries.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("primary key not found for model '{0}'")]
    MissingPrimaryKey(String),
    #[error("duplicate primary key for model '{model}': '{first}' and '{second}'")]
    DuplicatePrimaryKey {
        model: String,
        first: String,
        second: String,
    },
    #[error("duplicate field '{field}' on model '{model}'")]
    DuplicateField { model: String, field: String },
    #[error("model '{0}' is not registered")]
    NotRegistered(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required option: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum OrmError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("'{model}' object has no attribute '{field}'")]
    AttributeNotFound { model: String, field: String },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("connection pool already initialized")]
    PoolAlreadyInitialized,
    #[error("connection pool not initialized")]
    PoolNotInitialized,
}

impl From<std::convert::Infallible> for OrmError {
    fn from(e: std::convert::Infallible) -> Self {
        match e {}
    }
}

impl OrmError {
    pub(crate) fn attribute(model: &str, field: &str) -> Self {
        OrmError::AttributeNotFound {
            model: model.to_string(),
            field: field.to_string(),
        }
    }
}
