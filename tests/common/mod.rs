// Shared fixtures for the integration tests: an in-memory `DataClient` and
// state builders. Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use supabase_gateway::config::ProjectDefaults;
use supabase_gateway::db::{ClientError, DataClient, RangeSelection};
use supabase_gateway::models::Row;
use supabase_gateway::state::AppState;

/// In-memory stand-in for the backing service.
#[derive(Default)]
pub struct FakeClient {
    tables: BTreeMap<String, Vec<Row>>,
    /// Artificial latency per table, to provoke out-of-order completion.
    delays: BTreeMap<String, Duration>,
    fail_transport: bool,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, rows: usize) -> Self {
        let rows = (0..rows)
            .map(|i| row(json!({ "id": i + 1, "name": format!("{name}-{}", i + 1) })))
            .collect();
        self.tables.insert(name.to_string(), rows);
        self
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self
    }

    /// Every call fails as if the service were unreachable.
    pub fn unreachable() -> Self {
        Self {
            fail_transport: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.fail_transport {
            Err(ClientError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DataClient for FakeClient {
    async fn list_tables(&self, _schema: &str, exclude: &str) -> Result<Vec<String>, ClientError> {
        self.check()?;
        Ok(self.tables.keys().filter(|t| *t != exclude).cloned().collect())
    }

    async fn find_tables(&self, _schema: &str, name: &str) -> Result<Vec<String>, ClientError> {
        self.check()?;
        Ok(self.tables.keys().filter(|t| *t == name).cloned().collect())
    }

    async fn select_range(
        &self,
        _schema: &str,
        table: &str,
        from: u64,
        to: u64,
    ) -> Result<RangeSelection, ClientError> {
        self.check()?;
        if let Some(delay) = self.delays.get(table) {
            tokio::time::sleep(*delay).await;
        }
        let rows = self
            .tables
            .get(table)
            .ok_or_else(|| ClientError::Query(format!("relation \"public.{table}\" does not exist")))?;
        let page = rows
            .iter()
            .skip(from as usize)
            .take((to - from + 1) as usize)
            .cloned()
            .collect();
        Ok(RangeSelection {
            rows: page,
            total: rows.len() as u64,
        })
    }
}

pub fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

pub fn state_with(client: FakeClient) -> AppState {
    AppState::new(Arc::new(client), ProjectDefaults::default())
}

/// `users` (25 rows), `orders` (3 rows), `empty` (0 rows) and the diagnostic
/// view that listings must hide.
pub fn sample_client() -> FakeClient {
    FakeClient::new()
        .with_table("users", 25)
        .with_table("orders", 3)
        .with_table("empty", 0)
        .with_table("pg_stat_statements", 1)
}
