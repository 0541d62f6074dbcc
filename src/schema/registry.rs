//! Process-wide, write-once store of compiled schemas keyed by record type.

use crate::error::SchemaError;
use crate::schema::builder::Schema;
use crate::schema::field::Field;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A record type: a name, optional table override, and its declared fields in order.
///
/// ```ignore
/// struct User;
/// impl Model for User {
///     const NAME: &'static str = "User";
///     fn fields() -> Vec<(&'static str, Field)> {
///         vec![("id", Field::string().primary_key()), ("name", Field::string())]
///     }
/// }
/// ```
pub trait Model: 'static {
    const NAME: &'static str;
    const TABLE: Option<&'static str> = None;

    fn fields() -> Vec<(&'static str, Field)>;
}

fn registry() -> &'static RwLock<HashMap<TypeId, Arc<Schema>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<TypeId, Arc<Schema>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Compile and store the schema for `M`. Later calls return the stored schema unchanged.
pub fn register<M: Model>() -> Result<Arc<Schema>, SchemaError> {
    let key = TypeId::of::<M>();
    if let Some(s) = registry().read().unwrap_or_else(PoisonError::into_inner).get(&key) {
        return Ok(s.clone());
    }
    let mut builder = Schema::builder(M::NAME);
    if let Some(table) = M::TABLE {
        builder = builder.table(table);
    }
    for (attr, field) in M::fields() {
        builder = builder.field(attr, field);
    }
    let schema = Arc::new(builder.build()?);
    let mut map = registry().write().unwrap_or_else(PoisonError::into_inner);
    Ok(map.entry(key).or_insert(schema).clone())
}

pub fn schema_of<M: Model>() -> Result<Arc<Schema>, SchemaError> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&TypeId::of::<M>())
        .cloned()
        .ok_or_else(|| SchemaError::NotRegistered(M::NAME.to_string()))
}
