//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use tiny_orm::{Executor, OrmError, Row};

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub sql: String,
    pub args: Vec<Value>,
    pub limit: Option<usize>,
}

/// Records every statement and answers with queued rows / affected counts.
#[derive(Default)]
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<Call>>,
    rows: Mutex<VecDeque<Vec<Row>>>,
    affected: Mutex<VecDeque<u64>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| match v {
                Value::Object(m) => m,
                other => panic!("row must be an object, got {}", other),
            })
            .collect();
        self.rows.lock().unwrap().push_back(rows);
        self
    }

    pub fn with_affected(self, n: u64) -> Self {
        self.affected.lock().unwrap().push_back(n);
        self
    }

    pub fn failing(self, message: &str) -> Self {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn last(&self) -> Call {
        self.calls.lock().unwrap().last().cloned().expect("no statement was issued")
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<(), OrmError> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            args: args.to_vec(),
            limit,
        });
        match self.fail_with.lock().unwrap().as_ref() {
            Some(m) => Err(OrmError::Db(sqlx::Error::Protocol(m.clone()))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn select(&self, sql: &str, args: &[Value], limit: Option<usize>) -> Result<Vec<Row>, OrmError> {
        self.record(sql, args, limit)?;
        let mut rows = self.rows.lock().unwrap().pop_front().unwrap_or_default();
        if let Some(n) = limit {
            rows.truncate(n);
        }
        Ok(rows)
    }

    async fn execute(&self, sql: &str, args: &[Value], _autocommit: bool) -> Result<u64, OrmError> {
        self.record(sql, args, None)?;
        Ok(self.affected.lock().unwrap().pop_front().unwrap_or(1))
    }
}
