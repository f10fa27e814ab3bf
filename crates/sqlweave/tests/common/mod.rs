#![allow(dead_code)]

use serde_json::Value;
use sqlweave::{Executor, Param, Row, WeaveError, WeaveResult};
use std::sync::Mutex;
use std::time::Duration;

/// One statement handed to the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub sql: String,
    pub params: Vec<Param>,
}

/// In-memory executor that records statements and replays canned results.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    rows: Vec<Row>,
    affected: u64,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows.into_iter().map(row).collect();
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last(&self) -> Call {
        self.calls().pop().expect("no statement was executed")
    }

    async fn record(&self, sql: &str, params: &[Param]) -> WeaveResult<()> {
        self.calls.lock().unwrap().push(Call {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(message) => Err(WeaveError::Execution(message.clone())),
            None => Ok(()),
        }
    }
}

impl Executor for RecordingExecutor {
    async fn fetch(&self, sql: &str, params: &[Param]) -> WeaveResult<Vec<Row>> {
        self.record(sql, params).await?;
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str, params: &[Param]) -> WeaveResult<u64> {
        self.record(sql, params).await?;
        Ok(self.affected)
    }
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
