//! Mock data stores for testing.
//!
//! `MockStore` answers queries from canned results and records every SQL
//! string it receives; `FailingStore` rejects everything.

use super::{ColumnInfo, DataStore, QueryResult, Row};
use crate::error::{ExportError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock store that returns predefined results.
///
/// Responses are matched in registration order against a substring of the
/// incoming SQL; unmatched queries return an empty result.
#[derive(Default)]
pub struct MockStore {
    responses: Vec<(String, QueryResult)>,
    delay: Option<Duration>,
    executed: Mutex<Vec<String>>,
}

impl MockStore {
    /// Creates a mock store with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rows returned for any SQL containing `needle`.
    pub fn with_response(mut self, needle: impl Into<String>, rows: Vec<Row>) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let columns = (0..width)
            .map(|i| ColumnInfo::new(format!("c{i}"), "TEXT"))
            .collect();
        self.responses
            .push((needle.into(), QueryResult::with_data(columns, rows)));
        self
    }

    /// Makes every query sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns every SQL string executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|sql| sql.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataStore for MockStore {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self
            .responses
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A store whose queries always fail.
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    /// Creates a failing store reporting the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DataStore for FailingStore {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(ExportError::execution(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Value;

    #[tokio::test]
    async fn test_mock_matches_substring() {
        let store = MockStore::new().with_response("cargo__books", vec![vec![Value::from("Dune")]]);

        let result = store
            .execute_query("SELECT \"title\" FROM \"cargo__books\"")
            .await
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.columns.len(), 1);

        let result = store.execute_query("SELECT 1 FROM other").await.unwrap();
        assert!(result.is_empty());

        assert_eq!(store.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = FailingStore::new("no such table");
        let result = store.execute_query("SELECT 1").await;
        assert!(matches!(result, Err(ExportError::Execution(_))));
    }
}
