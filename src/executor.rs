//! The two primitives every finder is built on.

use crate::error::OrmError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row: column name to value, in column order.
pub type Row = Map<String, Value>;

/// Runs `?`-parameterized SQL. Implementations lease a connection per call and
/// release it on every exit path, including cancellation of the returned future.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Up to `limit` rows (all rows when `None`), in result order.
    async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>, OrmError>;

    /// Affected row count of a mutating statement. With `autocommit = false`
    /// the statement runs inside begin/commit on the leased connection.
    async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64, OrmError>;
}
