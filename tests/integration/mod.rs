//! Integration tests for db-export.
//!
//! These run against an in-memory SQLite store seeded per test.

pub mod common;
pub mod export_test;
pub mod page_values_test;
