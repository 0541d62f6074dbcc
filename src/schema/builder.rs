//! Compiles declared fields into an immutable Schema with its four statement templates.

use crate::error::SchemaError;
use crate::schema::field::Field;
use crate::sql::{compile_templates, create_table};
use std::collections::HashMap;

/// Compiled mapping of one record type: table, key, ordered fields, statement templates.
#[derive(Clone, Debug)]
pub struct Schema {
    pub name: String,
    pub table_name: String,
    pub primary_key: String,
    /// Non-key field names in declaration order.
    pub other_fields: Vec<String>,
    pub fields_by_name: HashMap<String, Field>,
    pub select_sql: String,
    pub insert_sql: String,
    pub update_sql: String,
    pub delete_sql: String,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields_by_name.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields_by_name.contains_key(name)
    }

    /// Key first, then the other fields: the column order of `select_sql`.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_key.as_str()).chain(self.other_fields.iter().map(String::as_str))
    }

    pub fn create_table_sql(&self) -> String {
        let cols: Vec<(&str, &str)> = self
            .columns()
            .filter_map(|c| self.fields_by_name.get(c).map(|f| (c, f.column_type.ddl())))
            .collect();
        create_table(&self.table_name, &self.primary_key, &cols)
    }
}

/// Collects (attribute, field) declarations in order; `build` runs once per record type.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    table: Option<String>,
    fields: Vec<(String, Field)>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaBuilder {
            name: name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    /// Table name override; the type name is used otherwise.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, attr: impl Into<String>, field: Field) -> Self {
        self.fields.push((attr.into(), field));
        self
    }

    pub fn build(self) -> Result<Schema, SchemaError> {
        let table_name = self.table.unwrap_or_else(|| self.name.clone());
        let mut primary_key: Option<String> = None;
        let mut other_fields = Vec::new();
        let mut fields_by_name = HashMap::with_capacity(self.fields.len());

        for (attr, mut field) in self.fields {
            let name = field.name.clone().unwrap_or(attr);
            field.name = Some(name.clone());
            if field.primary_key {
                if let Some(first) = &primary_key {
                    return Err(SchemaError::DuplicatePrimaryKey {
                        model: self.name,
                        first: first.clone(),
                        second: name,
                    });
                }
                primary_key = Some(name.clone());
            } else {
                other_fields.push(name.clone());
            }
            if fields_by_name.insert(name.clone(), field).is_some() {
                return Err(SchemaError::DuplicateField {
                    model: self.name,
                    field: name,
                });
            }
        }

        let primary_key = primary_key.ok_or_else(|| SchemaError::MissingPrimaryKey(self.name.clone()))?;
        let t = compile_templates(&table_name, &primary_key, &other_fields);
        tracing::info!(model = %self.name, table = %table_name, "found model");

        Ok(Schema {
            name: self.name,
            table_name,
            primary_key,
            other_fields,
            fields_by_name,
            select_sql: t.select,
            insert_sql: t.insert,
            update_sql: t.update,
            delete_sql: t.delete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> SchemaBuilder {
        Schema::builder("User")
            .field("id", Field::string().primary_key().ddl("varchar(50)"))
            .field("name", Field::string())
            .field("email", Field::string())
            .field("passwd", Field::string())
            .field("image", Field::string().default_value("about:blank"))
    }

    #[test]
    fn builds_user_schema() {
        let s = user().build().unwrap();
        assert_eq!(s.table_name, "User");
        assert_eq!(s.primary_key, "id");
        assert_eq!(s.other_fields, vec!["name", "email", "passwd", "image"]);
        assert_eq!(s.select_sql, "select `id`, `name`, `email`, `passwd`, `image` from `User`");
        assert_eq!(
            s.insert_sql,
            "insert into `User` (`name`, `email`, `passwd`, `image`, `id`) values (?, ?, ?, ?, ?)"
        );
        assert_eq!(
            s.update_sql,
            "update `User` set `name` = ?, `email` = ?, `passwd` = ?, `image` = ? where `id` = ?"
        );
        assert_eq!(s.delete_sql, "delete from `User` where `id` = ?");
    }

    #[test]
    fn key_position_does_not_change_field_order() {
        let s = Schema::builder("Blog")
            .field("title", Field::string())
            .field("summary", Field::text())
            .field("id", Field::string().primary_key())
            .field("views", Field::integer())
            .build()
            .unwrap();
        assert_eq!(s.other_fields, vec!["title", "summary", "views"]);
        assert_eq!(s.columns().collect::<Vec<_>>(), vec!["id", "title", "summary", "views"]);
    }

    #[test]
    fn table_override_and_column_rename() {
        let s = Schema::builder("Comment")
            .table("comments")
            .field("id", Field::integer().primary_key())
            .field("body", Field::text().name("content"))
            .build()
            .unwrap();
        assert_eq!(s.table_name, "comments");
        assert_eq!(s.other_fields, vec!["content"]);
        assert!(s.has_field("content"));
        assert!(!s.has_field("body"));
        assert_eq!(s.delete_sql, "delete from `comments` where `id` = ?");
    }

    #[test]
    fn missing_primary_key_fails() {
        let err = Schema::builder("T").field("a", Field::string()).build().unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey("T".into()));
        let err = Schema::builder("Empty").build().unwrap_err();
        assert_eq!(err, SchemaError::MissingPrimaryKey("Empty".into()));
    }

    #[test]
    fn duplicate_primary_key_fails() {
        let err = Schema::builder("T")
            .field("a", Field::string().primary_key())
            .field("b", Field::integer().primary_key())
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicatePrimaryKey { ref first, ref second, .. } if first == "a" && second == "b"));
    }

    #[test]
    fn duplicate_column_name_fails() {
        let err = Schema::builder("T")
            .field("id", Field::string().primary_key())
            .field("a", Field::string())
            .field("b", Field::string().name("a"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn create_table_uses_field_ddl() {
        let s = user().build().unwrap();
        assert_eq!(
            s.create_table_sql(),
            "create table if not exists `User` (`id` varchar(50) not null, `name` varchar(100), \
             `email` varchar(100), `passwd` varchar(100), `image` varchar(100), primary key (`id`))"
        );
    }
}
