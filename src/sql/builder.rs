//! Builds the per-schema statement templates and the parameterized finder queries.
//! Identifiers come from schema declarations only; values always go through `?`.

use crate::error::OrmError;
use serde_json::Value;

/// Quote identifier for MySQL (safe: only from schema declarations).
pub fn quoted(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

/// `n` comma-separated `?` markers.
pub fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Count `?` markers outside of quoted literals and identifiers.
/// Inside `'` or `"` literals a backslash escapes the next character.
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars();
    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('\'') | Some('"') if c == '\\' => {
                chars.next();
            }
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}

/// The four statements compiled once per schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Templates {
    pub select: String,
    pub insert: String,
    pub update: String,
    pub delete: String,
}

/// select: pk first, then fields; insert: fields then pk; update/delete keyed by pk.
pub fn compile_templates(table: &str, pk: &str, fields: &[String]) -> Templates {
    let table = quoted(table);
    let pk = quoted(pk);
    let escaped: Vec<String> = fields.iter().map(|f| quoted(f)).collect();

    let mut select_cols = vec![pk.clone()];
    select_cols.extend(escaped.iter().cloned());

    let mut insert_cols = escaped.clone();
    insert_cols.push(pk.clone());

    let sets: Vec<String> = escaped.iter().map(|f| format!("{} = ?", f)).collect();

    Templates {
        select: format!("select {} from {}", select_cols.join(", "), table),
        insert: format!(
            "insert into {} ({}) values ({})",
            table,
            insert_cols.join(", "),
            placeholders(insert_cols.len())
        ),
        update: format!("update {} set {} where {} = ?", table, sets.join(", "), pk),
        delete: format!("delete from {} where {} = ?", table, pk),
    }
}

/// `create table` DDL from (column, ddl type) pairs; the key column is `not null`.
pub fn create_table(table: &str, pk: &str, columns: &[(&str, &str)]) -> String {
    let mut defs: Vec<String> = columns
        .iter()
        .map(|(name, ddl)| {
            if *name == pk {
                format!("{} {} not null", quoted(name), ddl)
            } else {
                format!("{} {}", quoted(name), ddl)
            }
        })
        .collect();
    defs.push(format!("primary key ({})", quoted(pk)));
    format!("create table if not exists {} ({})", quoted(table), defs.join(", "))
}

#[derive(Debug, Default)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        QueryBuf {
            sql: sql.into(),
            params,
        }
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push(' ');
        self.sql.push_str(fragment);
    }
}

/// Row window for list queries: `limit ?` or `limit ?, ?` (offset, count).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Count(u64),
    Range(u64, u64),
}

impl Limit {
    fn render(self, q: &mut QueryBuf) {
        match self {
            Limit::Count(n) => {
                q.push("limit ?");
                q.params.push(Value::from(n));
            }
            Limit::Range(offset, count) => {
                q.push("limit ?, ?");
                q.params.push(Value::from(offset));
                q.params.push(Value::from(count));
            }
        }
    }
}

impl From<u64> for Limit {
    fn from(n: u64) -> Self {
        Limit::Count(n)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::Range(offset, count)
    }
}

fn non_negative(n: i32) -> Result<u64, OrmError> {
    u64::try_from(n).map_err(|_| OrmError::InvalidArgument(format!("invalid limit value: {}", n)))
}

/// Plain integer literals land here, so `limit(5)` works without a suffix.
impl TryFrom<i32> for Limit {
    type Error = OrmError;

    fn try_from(n: i32) -> Result<Self, Self::Error> {
        non_negative(n).map(Limit::Count)
    }
}

impl TryFrom<(i32, i32)> for Limit {
    type Error = OrmError;

    fn try_from((offset, count): (i32, i32)) -> Result<Self, Self::Error> {
        Ok(Limit::Range(non_negative(offset)?, non_negative(count)?))
    }
}

/// Accepts an integer count or a two-integer `[offset, count]` array.
impl TryFrom<&Value> for Limit {
    type Error = OrmError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        let invalid = || OrmError::InvalidArgument(format!("invalid limit value: {}", v));
        match v {
            Value::Number(n) => n.as_u64().map(Limit::Count).ok_or_else(invalid),
            Value::Array(items) if items.len() == 2 => {
                match (items[0].as_u64(), items[1].as_u64()) {
                    (Some(offset), Some(count)) => Ok(Limit::Range(offset, count)),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}

/// `<select> [where ..] [order by ..] [limit ..]`; each clause independent of the others.
pub fn select_list(
    select_sql: &str,
    where_clause: Option<&str>,
    args: &[Value],
    order_by: Option<&str>,
    limit: Option<Limit>,
) -> QueryBuf {
    let mut q = QueryBuf::new(select_sql, args.to_vec());
    if let Some(w) = where_clause {
        q.push("where");
        q.push(w);
    }
    if let Some(o) = order_by {
        q.push("order by");
        q.push(o);
    }
    if let Some(l) = limit {
        l.render(&mut q);
    }
    q
}

/// SELECT by primary key. Caller's key is the sole param.
pub fn select_by_pk(select_sql: &str, pk: &str, id: Value) -> QueryBuf {
    QueryBuf::new(format!("{} where {} = ?", select_sql, quoted(pk)), vec![id])
}

/// Aggregate aliased as `_num_`, e.g. `count(id)`.
pub fn select_number(table: &str, select_expr: &str, where_clause: Option<&str>, args: &[Value]) -> QueryBuf {
    let mut q = QueryBuf::new(
        format!("select {} {} from {}", select_expr, quoted(NUM_ALIAS), quoted(table)),
        args.to_vec(),
    );
    if let Some(w) = where_clause {
        q.push("where");
        q.push(w);
    }
    q
}

pub const NUM_ALIAS: &str = "_num_";
