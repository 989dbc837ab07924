//! Configuration management for db-export.
//!
//! Handles loading configuration from TOML files and environment variables:
//! store connection settings, site link settings, page-data tables,
//! localized messages, and schema declarations.

use crate::error::{ExportError, Result};
use crate::messages::Messages;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Data store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Settings used to build page links.
    #[serde(default)]
    pub site: SiteConfig,

    /// Which built-in page tables hold data.
    #[serde(default)]
    pub page_data: PageDataConfig,

    /// Localized user-facing messages.
    #[serde(default)]
    pub messages: Messages,

    /// Declared tables, in declaration order.
    #[serde(default)]
    pub tables: Vec<TableDeclaration>,
}

/// Data store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection URL (`sqlite:...` or `postgres://...`).
    pub url: Option<String>,

    /// Prefix of the physical tables holding declared tables.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,

    /// Seconds a single query may run before the export fails.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Row limit applied when a query does not specify one.
    #[serde(default = "default_query_limit")]
    pub default_query_limit: u64,

    /// Upper bound for any requested limit.
    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: u64,
}

fn default_table_prefix() -> String {
    "cargo__".to_string()
}

fn default_query_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    5
}

fn default_query_limit() -> u64 {
    100
}

fn default_max_query_limit() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            table_prefix: default_table_prefix(),
            query_timeout_secs: default_query_timeout_secs(),
            max_connections: default_max_connections(),
            default_query_limit: default_query_limit(),
            max_query_limit: default_max_query_limit(),
        }
    }
}

impl StoreConfig {
    /// Fills the URL from `DATABASE_URL` when the file left it unset.
    pub fn apply_env_defaults(&mut self) {
        if self.url.is_none() {
            self.url = std::env::var("DATABASE_URL").ok();
        }
    }
}

/// Settings used to turn page names into URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host prepended to local URLs for full links.
    #[serde(default = "default_server")]
    pub server: String,

    /// Local URL pattern; `$1` is replaced by the encoded page name.
    #[serde(default = "default_article_path")]
    pub article_path: String,

    /// Render times as `2:30:00 PM` instead of `14:30:00`.
    #[serde(default)]
    pub american_dates: bool,
}

fn default_server() -> String {
    "http://localhost".to_string()
}

fn default_article_path() -> String {
    "/index.php?title=$1".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            article_path: default_article_path(),
            american_dates: false,
        }
    }
}

/// Columns stored for every page and file; a non-empty list enables the
/// corresponding `_pageData` / `_fileData` table in page values.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PageDataConfig {
    #[serde(default)]
    pub page_data_columns: Vec<String>,

    #[serde(default)]
    pub file_data_columns: Vec<String>,
}

/// A table declaration: a name plus `field=Type` declarations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableDeclaration {
    pub name: String,

    #[serde(default)]
    pub fields: Vec<String>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("db-export")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ExportError::configuration(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            ExportError::configuration(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.store.query_timeout_secs == 0 {
            return Err(ExportError::configuration(
                "store.query_timeout_secs must be greater than zero",
            ));
        }
        if self.store.default_query_limit > self.store.max_query_limit {
            return Err(ExportError::configuration(
                "store.default_query_limit cannot exceed store.max_query_limit",
            ));
        }
        if !self.site.article_path.contains("$1") {
            return Err(ExportError::configuration(
                "site.article_path must contain the $1 placeholder",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[store]
url = "sqlite://wiki.db"
table_prefix = "cargo__"
query_timeout_secs = 10

[site]
server = "https://wiki.example.org"
article_path = "/wiki/$1"

[page_data]
page_data_columns = ["creationDate"]

[messages]
none = "Keine"

[[tables]]
name = "books"
fields = ["title=String", "authors=List (;) of Page", "published=Date"]
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.store.url.as_deref(), Some("sqlite://wiki.db"));
        assert_eq!(config.store.query_timeout_secs, 10);
        assert_eq!(config.store.max_query_limit, 5000);
        assert_eq!(config.site.article_path, "/wiki/$1");
        assert_eq!(config.page_data.page_data_columns, vec!["creationDate"]);
        assert_eq!(config.messages.none, "Keine");
        assert_eq!(config.tables.len(), 1);
        assert_eq!(config.tables[0].fields[1], "authors=List (;) of Page");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.table_prefix, "cargo__");
        assert_eq!(config.store.query_timeout_secs, 30);
        assert_eq!(config.store.default_query_limit, 100);
        assert_eq!(config.site.article_path, "/index.php?title=$1");
        assert!(!config.site.american_dates);
        assert!(config.tables.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.store.max_connections, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nurl = \"sqlite::memory:\"").unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.store.url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store\nurl = 1").unwrap();

        let err = Config::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("Configuration error in"));
    }

    #[test]
    fn test_validate_rejects_article_path_without_placeholder() {
        let mut config = Config::default();
        config.site.article_path = "/wiki/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_limits() {
        let mut config = Config::default();
        config.store.default_query_limit = 10_000;
        assert!(config.validate().is_err());
    }
}
