//! Record: one mapped row, field values plus the schema they conform to.

use crate::error::{OrmError, SchemaError};
use crate::executor::Row;
use crate::schema::{schema_of, Model, Schema};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct Record {
    schema: Arc<Schema>,
    values: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(schema: Arc<Schema>) -> Self {
        Record {
            schema,
            values: BTreeMap::new(),
        }
    }

    /// Empty record of a registered model.
    pub fn of<M: Model>() -> Result<Self, SchemaError> {
        Ok(Self::new(schema_of::<M>()?))
    }

    /// Build from (field, value) pairs; every name must be declared.
    pub fn with_values<K, I>(schema: Arc<Schema>, values: I) -> Result<Self, OrmError>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut r = Self::new(schema);
        for (k, v) in values {
            r.set(k, v)?;
        }
        Ok(r)
    }

    /// Rebuild from a result row. Declared columns are coerced to their column type;
    /// columns the schema does not know are dropped.
    pub fn from_row(schema: Arc<Schema>, row: Row) -> Self {
        let mut values = BTreeMap::new();
        for (name, value) in row {
            match schema.field(&name) {
                Some(f) => {
                    values.insert(name, f.column_type.coerce(value));
                }
                None => tracing::trace!(model = %schema.name, column = %name, "ignoring unmapped column"),
            }
        }
        Record { schema, values }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn check(&self, field: &str) -> Result<(), OrmError> {
        if self.schema.has_field(field) {
            Ok(())
        } else {
            Err(OrmError::attribute(&self.schema.name, field))
        }
    }

    /// Stored value, or `None` when unset. Defaults are not resolved.
    pub fn get(&self, field: &str) -> Result<Option<&Value>, OrmError> {
        self.check(field)?;
        Ok(self.values.get(field))
    }

    /// Stored value; otherwise the field's default, which is stored back so it
    /// resolves at most once per record. `None` when unset with no default.
    pub fn get_or_default(&mut self, field: &str) -> Result<Option<Value>, OrmError> {
        self.check(field)?;
        if let Some(v) = self.values.get(field) {
            return Ok(Some(v.clone()));
        }
        let Some(default) = self.schema.field(field).and_then(|f| f.default.as_ref()) else {
            return Ok(None);
        };
        let value = default.resolve();
        tracing::debug!(model = %self.schema.name, field = %field, value = %value, "using default value");
        self.values.insert(field.to_string(), value.clone());
        Ok(Some(value))
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Result<(), OrmError> {
        let field = field.into();
        self.check(&field)?;
        self.values.insert(field, value.into());
        Ok(())
    }

    /// Typed read of a stored value.
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> Result<Option<T>, OrmError> {
        self.get(field)?
            .map(|v| {
                serde_json::from_value(v.clone()).map_err(|e| {
                    OrmError::InvalidArgument(format!("{}.{}: {}", self.schema.name, field, e))
                })
            })
            .transpose()
    }

    /// Stored primary key value, without default resolution.
    pub fn primary_key(&self) -> Option<&Value> {
        self.values.get(&self.schema.primary_key)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_row(self) -> Row {
        self.values.into_iter().collect::<Map<String, Value>>()
    }
}

/// Same schema and same field values.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema.table_name == other.schema.table_name)
            && self.values == other.values
    }
}
