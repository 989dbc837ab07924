//! Query building and execution.
//!
//! [`QueryBuilder`] resolves request parameters against the schema catalog
//! into [`QuerySpec`]s; [`QueryExecutor`] runs them and yields
//! [`ResultRow`]s in projection order.

mod builder;
mod executor;
pub mod parse;
mod row;
mod spec;

pub use builder::{QueryBuilder, QueryParams, DEFAULT_FIELDS};
pub use executor::QueryExecutor;
pub use row::ResultRow;
pub use spec::{FieldRole, FieldSpec, JoinColumn, JoinCondition, QuerySpec, TableRef};
