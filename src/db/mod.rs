//! Data store abstraction layer.
//!
//! Provides a trait-based interface for executing rendered SQL, allowing
//! different database backends to be used interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingStore, MockStore};
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::StoreConfig;
use crate::error::{ExportError, Result};
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Sqlite,
    Postgres,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Detects the backend from a connection URL's scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_lowercase();
        match scheme.as_str() {
            "sqlite" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Creates a data store for the configured URL.
///
/// This is the central factory function for store connections.
pub async fn connect(config: &StoreConfig) -> Result<Box<dyn DataStore>> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| ExportError::configuration("No database URL configured"))?;

    match DatabaseBackend::from_url(url) {
        Some(DatabaseBackend::Sqlite) => {
            let store = SqliteStore::connect(url, config.max_connections).await?;
            Ok(Box::new(store))
        }
        Some(DatabaseBackend::Postgres) => {
            let store = PostgresStore::connect(url, config.max_connections).await?;
            Ok(Box::new(store))
        }
        None => Err(ExportError::configuration(format!(
            "Unsupported database URL '{url}'. Expected sqlite: or postgres://"
        ))),
    }
}

/// Trait defining the interface for the raw SQL execution engine.
///
/// Implementations return values positionally, in projection order.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the underlying connection pool.
    async fn close(&self) -> Result<()>;
}
