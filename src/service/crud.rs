//! Record-level CRUD over any `Executor`, driven by the schema's compiled templates.

use crate::error::OrmError;
use crate::executor::Executor;
use crate::record::Record;
use crate::schema::Schema;
use crate::sql::{select_by_pk, select_list, select_number, Limit, NUM_ALIAS};
use serde_json::Value;
use std::sync::Arc;

/// Options for `Record::find_all`. Every clause is optional and independent.
#[derive(Clone, Debug, Default)]
pub struct FindAll {
    /// Raw condition appended after `where`, with `?` markers for `args`.
    pub where_clause: Option<String>,
    pub args: Vec<Value>,
    /// Raw `order by` expression, e.g. ``"`created_at` desc"``.
    pub order_by: Option<String>,
    pub limit: Option<Limit>,
    /// Rejected `limit` argument, reported by `find_all`.
    bad_limit: Option<String>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, where_clause: impl Into<String>, args: Vec<Value>) -> Self {
        self.where_clause = Some(where_clause.into());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// A count or an `(offset, count)` pair. A negative value fails `find_all`
    /// with `InvalidArgument`.
    pub fn limit<L>(mut self, limit: L) -> Self
    where
        L: TryInto<Limit>,
        L::Error: Into<OrmError>,
    {
        match limit.try_into() {
            Ok(l) => {
                self.limit = Some(l);
                self.bad_limit = None;
            }
            Err(e) => {
                self.limit = None;
                self.bad_limit = Some(match e.into() {
                    OrmError::InvalidArgument(msg) => msg,
                    other => other.to_string(),
                });
            }
        }
        self
    }
}

/// Affected-row count of `save`/`update`/`remove`. Anything but one row is a
/// data-integrity warning for the caller, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct WriteOutcome {
    pub affected: u64,
}

impl WriteOutcome {
    pub fn is_single_row(&self) -> bool {
        self.affected == 1
    }
}

impl Record {
    /// Records matching the options, in result order.
    pub async fn find_all<E>(exec: &E, schema: &Arc<Schema>, query: FindAll) -> Result<Vec<Record>, OrmError>
    where
        E: Executor + ?Sized,
    {
        if let Some(msg) = query.bad_limit {
            return Err(OrmError::InvalidArgument(msg));
        }
        let q = select_list(
            &schema.select_sql,
            query.where_clause.as_deref(),
            &query.args,
            query.order_by.as_deref(),
            query.limit,
        );
        let rows = exec.select(&q.sql, &q.params, None).await?;
        Ok(rows.into_iter().map(|r| Record::from_row(schema.clone(), r)).collect())
    }

    /// Scalar aggregate such as `count(id)`; `None` when no row comes back.
    pub async fn find_number<E>(
        exec: &E,
        schema: &Schema,
        select_expr: &str,
        where_clause: Option<&str>,
        args: &[Value],
    ) -> Result<Option<Value>, OrmError>
    where
        E: Executor + ?Sized,
    {
        let q = select_number(&schema.table_name, select_expr, where_clause, args);
        let rows = exec.select(&q.sql, &q.params, Some(1)).await?;
        Ok(rows.into_iter().next().map(|mut r| r.remove(NUM_ALIAS).unwrap_or(Value::Null)))
    }

    /// Record by primary key, or `None`.
    pub async fn find<E>(exec: &E, schema: &Arc<Schema>, pk: impl Into<Value>) -> Result<Option<Record>, OrmError>
    where
        E: Executor + ?Sized,
    {
        let q = select_by_pk(&schema.select_sql, &schema.primary_key, pk.into());
        let rows = exec.select(&q.sql, &q.params, Some(1)).await?;
        Ok(rows.into_iter().next().map(|r| Record::from_row(schema.clone(), r)))
    }

    /// Insert: non-key fields in declared order, then the key, each resolved
    /// through its default when unset. Unset fields with no default bind `null`.
    pub async fn save<E>(&mut self, exec: &E) -> Result<WriteOutcome, OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = self.schema().clone();
        let mut args = Vec::with_capacity(schema.other_fields.len() + 1);
        for f in schema.other_fields.iter().chain(std::iter::once(&schema.primary_key)) {
            args.push(self.get_or_default(f)?.unwrap_or(Value::Null));
        }
        let affected = exec.execute(&schema.insert_sql, &args, true).await?;
        let outcome = WriteOutcome { affected };
        if !outcome.is_single_row() {
            tracing::warn!(model = %schema.name, affected, "failed to insert record: affected rows");
        }
        Ok(outcome)
    }

    /// Update every non-key field from its stored value, keyed by the stored primary key.
    pub async fn update<E>(&self, exec: &E) -> Result<WriteOutcome, OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = self.schema();
        let pk = self.required_key()?;
        let mut args = Vec::with_capacity(schema.other_fields.len() + 1);
        for f in &schema.other_fields {
            args.push(self.get(f)?.cloned().unwrap_or(Value::Null));
        }
        args.push(pk);
        let affected = exec.execute(&schema.update_sql, &args, true).await?;
        let outcome = WriteOutcome { affected };
        if !outcome.is_single_row() {
            tracing::warn!(model = %schema.name, affected, "failed to update by primary key: affected rows");
        }
        Ok(outcome)
    }

    /// Delete by the stored primary key. Defaults are not resolved: the key must be known.
    pub async fn remove<E>(&self, exec: &E) -> Result<WriteOutcome, OrmError>
    where
        E: Executor + ?Sized,
    {
        let schema = self.schema();
        let pk = self.required_key()?;
        let affected = exec.execute(&schema.delete_sql, &[pk], true).await?;
        let outcome = WriteOutcome { affected };
        if !outcome.is_single_row() {
            tracing::warn!(model = %schema.name, affected, "failed to remove by primary key: affected rows");
        }
        Ok(outcome)
    }

    fn required_key(&self) -> Result<Value, OrmError> {
        self.primary_key().cloned().ok_or_else(|| {
            OrmError::InvalidArgument(format!(
                "{}.{} must be set",
                self.schema().name,
                self.schema().primary_key
            ))
        })
    }
}
