//! Connection pool and the MySQL query executor.
//!
//! A lease is a sqlx `PoolConnection` held for one statement. It goes back to the
//! pool when dropped, so it is released on success, on error and when the
//! caller's future is cancelled mid-query.

use crate::config::{validate, PoolConfig};
use crate::error::OrmError;
use crate::executor::{Executor, Row};
use crate::sql::{bind_all, count_placeholders};
use async_trait::async_trait;
use futures::TryStreamExt;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Connection, Executor as _};
use std::sync::OnceLock;

static POOL: OnceLock<Pool> = OnceLock::new();

/// Create the process-wide pool. Must run before the first query; a second call
/// fails with `PoolAlreadyInitialized` and leaves the first pool in place.
pub async fn create_pool(config: &PoolConfig) -> Result<Pool, OrmError> {
    if POOL.get().is_some() {
        return Err(OrmError::PoolAlreadyInitialized);
    }
    let pool = Pool::connect(config).await?;
    if POOL.set(pool.clone()).is_err() {
        // lost a race with a concurrent create_pool
        pool.close().await;
        return Err(OrmError::PoolAlreadyInitialized);
    }
    Ok(pool)
}

/// Handle to the process-wide pool.
pub fn pool() -> Result<Pool, OrmError> {
    POOL.get().cloned().ok_or(OrmError::PoolNotInitialized)
}

/// Close the process-wide pool at shutdown. Queries issued afterwards fail with
/// a driver error; the pool is never re-created.
pub async fn close_pool() -> Result<(), OrmError> {
    let pool = POOL.get().ok_or(OrmError::PoolNotInitialized)?;
    pool.close().await;
    Ok(())
}

/// Bounded set of live MySQL connections. Cheap to clone; clones share connections.
#[derive(Clone, Debug)]
pub struct Pool {
    inner: MySqlPool,
}

impl Pool {
    /// Open a standalone pool, for callers that pass the handle down explicitly.
    pub async fn connect(config: &PoolConfig) -> Result<Self, OrmError> {
        validate(config)?;
        tracing::info!(
            host = %config.host,
            port = config.port,
            db = %config.db,
            min = config.min_size,
            max = config.max_size,
            "create database connection pool"
        );
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.db)
            .charset(&config.charset);
        let autocommit = config.autocommit;
        let inner = MySqlPoolOptions::new()
            .max_connections(config.max_size)
            .min_connections(config.min_size)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if !autocommit {
                        conn.execute("SET autocommit = 0").await?;
                    }
                    Ok(())
                })
            })
            .connect_with(options)
            .await?;
        Ok(Pool { inner })
    }

    pub fn from_pool(inner: MySqlPool) -> Self {
        Pool { inner }
    }

    pub fn inner(&self) -> &MySqlPool {
        &self.inner
    }

    /// Open connections, leased or idle.
    pub fn size(&self) -> u32 {
        self.inner.size()
    }

    pub fn num_idle(&self) -> usize {
        self.inner.num_idle()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub async fn close(&self) {
        tracing::info!("close database connection pool");
        self.inner.close().await;
    }
}

/// MySQL takes `?` natively, so the template passes through once the marker
/// count matches the arguments.
fn native_sql<'a>(sql: &'a str, args: &[Value]) -> Result<&'a str, OrmError> {
    let expected = count_placeholders(sql);
    if expected != args.len() {
        return Err(OrmError::InvalidArgument(format!(
            "statement has {} placeholders but {} arguments were given",
            expected,
            args.len()
        )));
    }
    Ok(sql)
}

fn driver_error(sql: &str) -> impl FnOnce(sqlx::Error) -> OrmError + '_ {
    move |e| {
        tracing::error!(sql = %sql, error = %e, "query failed");
        OrmError::Db(e)
    }
}

#[async_trait]
impl Executor for Pool {
    async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>, OrmError> {
        tracing::debug!(sql = %sql, args = ?args, "query");
        let sql = native_sql(sql, args)?;
        let mut rows = Vec::new();
        if limit == Some(0) {
            return Ok(rows);
        }
        let mut conn = self.inner.acquire().await.map_err(driver_error(sql))?;
        let mut stream = bind_all(sqlx::query(sql), args).fetch(&mut *conn);
        while let Some(row) = stream.try_next().await.map_err(driver_error(sql))? {
            rows.push(row_to_json(&row));
            if limit.is_some_and(|n| rows.len() >= n) {
                break;
            }
        }
        tracing::debug!(rows = rows.len(), "rows returned");
        Ok(rows)
    }

    async fn execute(&self, sql: &str, args: &[Value], autocommit: bool) -> Result<u64, OrmError> {
        tracing::debug!(sql = %sql, args = ?args, autocommit, "execute");
        let sql = native_sql(sql, args)?;
        let mut conn = self.inner.acquire().await.map_err(driver_error(sql))?;
        let done = if autocommit {
            bind_all(sqlx::query(sql), args)
                .execute(&mut *conn)
                .await
                .map_err(driver_error(sql))?
        } else {
            // an uncommitted transaction rolls back when dropped
            let mut tx = conn.begin().await.map_err(driver_error(sql))?;
            let done = bind_all(sqlx::query(sql), args)
                .execute(&mut *tx)
                .await
                .map_err(driver_error(sql))?;
            tx.commit().await.map_err(driver_error(sql))?;
            done
        };
        Ok(done.rows_affected())
    }
}

fn row_to_json(row: &MySqlRow) -> Row {
    use sqlx::Column;
    use sqlx::Row as _;
    let mut map = Row::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    map
}

fn cell_to_value(row: &MySqlRow, name: &str) -> Value {
    use sqlx::Row as _;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<u64>, _>(name) {
        return Value::from(n);
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    // sum() and avg() over integer columns come back as DECIMAL
    if let Ok(Some(d)) = row.try_get::<Option<Decimal>, _>(name) {
        return decimal_to_value(d);
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(name) {
        return Value::String(String::from_utf8_lossy(&bytes).into_owned());
    }
    Value::Null
}

/// Whole decimals become integers, the rest floats; the string form covers
/// values neither can hold.
fn decimal_to_value(d: Decimal) -> Value {
    let d = d.normalize();
    if d.scale() == 0 {
        if let Some(n) = d.to_i64() {
            return Value::from(n);
        }
    }
    d.to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(d.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_mismatch_is_invalid_argument() {
        let err = native_sql("select `a` from `t` where `a` = ?", &[]).unwrap_err();
        assert!(matches!(err, OrmError::InvalidArgument(_)));
        assert_eq!(native_sql("delete from `t` where `a` = ?", &[json!(1)]).unwrap(), "delete from `t` where `a` = ?");
    }

    #[test]
    fn decimal_cells_decode_to_numbers() {
        assert_eq!(decimal_to_value(Decimal::new(4200, 2)), json!(42));
        assert_eq!(decimal_to_value(Decimal::new(25000, 4)), json!(2.5));
        assert_eq!(decimal_to_value(Decimal::new(-7, 0)), json!(-7));
        assert_eq!(decimal_to_value(Decimal::MAX), json!(Decimal::MAX.to_f64().unwrap()));
    }

    #[test]
    fn pool_handle_requires_init() {
        // nothing in the unit test binary calls create_pool
        assert!(matches!(pool(), Err(OrmError::PoolNotInitialized)));
    }
}
