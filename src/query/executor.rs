//! Runs query specifications against a data store.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::db::{DataStore, Value};
use crate::error::{ExportError, Result};
use crate::safety::validate_statement;

use super::row::ResultRow;
use super::spec::QuerySpec;

/// Executes a [`QuerySpec`] and maps positional values to aliases.
pub struct QueryExecutor<'a> {
    store: &'a dyn DataStore,
    timeout: Duration,
}

impl<'a> QueryExecutor<'a> {
    /// Creates an executor; each query may run for at most `timeout`.
    pub fn new(store: &'a dyn DataStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Runs a query to completion.
    ///
    /// Rows keep the store's order (the `ORDER BY` when given) and every
    /// row carries every projected alias in projection order, padded with
    /// NULL when a row is short. A timeout, or a result whose column count
    /// differs from the projection, is an execution error.
    pub async fn run(&self, spec: &QuerySpec) -> Result<Vec<ResultRow>> {
        let sql = spec.to_sql();
        validate_statement(&sql)?;
        debug!("Executing: {}", sql);

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.store.execute_query(&sql))
            .await
            .map_err(|_| {
                ExportError::execution(format!(
                    "Query timed out after {} seconds",
                    self.timeout.as_secs_f64()
                ))
            })??;

        let columns = spec.column_names();
        if !result.rows.is_empty() && result.columns.len() != columns.len() {
            return Err(ExportError::execution(format!(
                "Store returned {} column(s) for {} projected field(s)",
                result.columns.len(),
                columns.len()
            )));
        }
        let rows: Vec<ResultRow> = result
            .rows
            .into_iter()
            .map(|values| {
                let mut values = values.into_iter();
                columns
                    .iter()
                    .map(|alias| (alias.clone(), values.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();

        debug!(
            "Query returned {} row(s) in {:?}",
            rows.len(),
            start.elapsed()
        );
        Ok(rows)
    }
}
