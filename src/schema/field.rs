//! Field descriptors: column name, SQL type, primary-key flag and default.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// SQL column type of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// Character column; carries the DDL used for `create table` (e.g. `varchar(50)`).
    Varchar(String),
    Boolean,
    BigInt,
    Real,
    Text,
}

impl ColumnType {
    pub fn ddl(&self) -> &str {
        match self {
            ColumnType::Varchar(ddl) => ddl,
            ColumnType::Boolean => "boolean",
            ColumnType::BigInt => "bigint",
            ColumnType::Real => "real",
            ColumnType::Text => "text",
        }
    }

    /// Normalize a value read back from the driver to this column's type.
    /// MySQL reports `boolean` as `tinyint(1)`, so 0/1 become `false`/`true`.
    pub fn coerce(&self, value: Value) -> Value {
        match (self, value) {
            (ColumnType::Boolean, Value::Number(n)) => Value::Bool(n.as_i64().unwrap_or(0) != 0),
            (ColumnType::Real, Value::Number(n)) => n
                .as_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Number(n)),
            (ColumnType::BigInt, Value::String(s)) => match s.parse::<i64>() {
                Ok(i) => Value::from(i),
                Err(_) => Value::String(s),
            },
            (_, v) => v,
        }
    }
}

/// Default for a field that was never set: a fixed value or a producer called per record.
#[derive(Clone)]
pub enum FieldDefault {
    Literal(Value),
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::Literal(v) => v.clone(),
            FieldDefault::Generator(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            FieldDefault::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: Option<String>,
    pub column_type: ColumnType,
    pub primary_key: bool,
    pub default: Option<FieldDefault>,
}

impl Field {
    fn new(column_type: ColumnType, default: Option<FieldDefault>) -> Self {
        Field {
            name: None,
            column_type,
            primary_key: false,
            default,
        }
    }

    /// `varchar(100)`, no default.
    pub fn string() -> Self {
        Self::new(ColumnType::Varchar("varchar(100)".into()), None)
    }

    /// `boolean`, defaults to `false`.
    pub fn boolean() -> Self {
        Self::new(ColumnType::Boolean, Some(FieldDefault::Literal(Value::Bool(false))))
    }

    /// `bigint`, defaults to `0`.
    pub fn integer() -> Self {
        Self::new(ColumnType::BigInt, Some(FieldDefault::Literal(Value::from(0))))
    }

    /// `real`, defaults to `0.0`.
    pub fn float() -> Self {
        Self::new(ColumnType::Real, Some(FieldDefault::Literal(Value::from(0.0))))
    }

    /// `text`, no default.
    pub fn text() -> Self {
        Self::new(ColumnType::Text, None)
    }

    /// Column name; when not given the declaring attribute's name is used.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Mark as primary key. Boolean and text columns cannot be keys.
    pub fn primary_key(mut self) -> Self {
        if !matches!(self.column_type, ColumnType::Boolean | ColumnType::Text) {
            self.primary_key = true;
        }
        self
    }

    /// Override the DDL of a string column (e.g. `varchar(50)`).
    pub fn ddl(mut self, ddl: impl Into<String>) -> Self {
        if let ColumnType::Varchar(_) = self.column_type {
            self.column_type = ColumnType::Varchar(ddl.into());
        }
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Literal(value.into()));
        self
    }

    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Generator(Arc::new(producer)));
        self
    }

    pub fn no_default(mut self) -> Self {
        self.default = None;
        self
    }
}

/// Time-ordered unique id: 15-digit millisecond timestamp, uuid4 hex, `000` suffix.
pub fn next_id() -> Value {
    let millis = chrono::Utc::now().timestamp_millis();
    Value::String(format!("{:015}{}000", millis, uuid::Uuid::new_v4().simple()))
}

/// Seconds since the epoch as a float, for `created_at`-style columns.
pub fn unix_timestamp() -> Value {
    let micros = chrono::Utc::now().timestamp_micros();
    Value::from(micros as f64 / 1_000_000.0)
}
