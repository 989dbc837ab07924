//! Command-line argument parsing for db-export.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Exports structured query results as calendar, timeline, chart, CSV,
/// spreadsheet or JSON data.
#[derive(Parser, Debug)]
#[command(name = "db-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Database URL (sqlite:... or postgres://...), overriding the config file
    #[arg(long, value_name = "URL", env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Also load table schemas declared in the store's cargo_tables table
    #[arg(long, global = true)]
    pub load_schemas: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run an export request given as a URL query string; headers go to stderr
    Export {
        /// Request parameters, e.g. "tables=books&fields=title&format=csv"
        #[arg(long, value_name = "QUERY")]
        query: String,

        /// Write the body to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Show every value stored for one page
    PageValues {
        /// Page ID
        #[arg(long, value_name = "ID")]
        page_id: i64,

        /// Page name used in the heading
        #[arg(long, value_name = "NAME")]
        page_name: String,

        /// Write the HTML to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Uses --config if given, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }
}
