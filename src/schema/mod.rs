//! Field declarations, schema compilation and the type-keyed schema registry.

pub mod builder;
pub mod field;
pub mod registry;

pub use builder::{Schema, SchemaBuilder};
pub use field::{next_id, unix_timestamp, ColumnType, Field, FieldDefault};
pub use registry::{register, schema_of, Model};
