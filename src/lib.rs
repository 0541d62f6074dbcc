//! Tiny ORM: declare record types as typed fields, compile them once into SQL
//! templates, and run CRUD against a pooled MySQL connection set.

pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod record;
pub mod schema;
pub mod service;
pub mod sql;

pub use config::PoolConfig;
pub use error::{ConfigError, OrmError, SchemaError};
pub use executor::{Executor, Row};
pub use pool::{close_pool, create_pool, pool, Pool};
pub use record::Record;
pub use schema::{next_id, register, schema_of, unix_timestamp, ColumnType, Field, FieldDefault, Model, Schema, SchemaBuilder};
pub use service::{FindAll, WriteOutcome};
pub use sql::Limit;
