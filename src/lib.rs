//! db-export - structured query export.
//!
//! Builds SQL queries from declared table schemas, runs them against a
//! SQLite or PostgreSQL store and renders the rows as calendar events,
//! timeline events, chart series, CSV, a spreadsheet or JSON. Also lists
//! every value stored for a page.

pub mod cli;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod export;
pub mod format;
pub mod logging;
pub mod messages;
pub mod page_values;
pub mod query;
pub mod safety;
pub mod schema;
pub mod site;
