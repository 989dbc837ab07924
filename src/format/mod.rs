//! Result formatters: one strategy per export format.
//!
//! Every formatter receives the executed queries in request order, coerces
//! rows in place and encodes the whole response body at once.

mod calendar;
mod chart;
pub mod encode;
mod json;
pub mod markup;
mod rules;
mod spreadsheet;
mod tabular;
mod timeline;

pub use calendar::CalendarFormatter;
pub use chart::{series_color, ChartFormatter, SERIES_PALETTE};
pub use encode::{encode_json, JsonOptions};
pub use json::JsonFormatter;
pub use rules::{FieldRule, FieldSource};
pub use spreadsheet::SpreadsheetFormatter;
pub use tabular::CsvFormatter;
pub use timeline::TimelineFormatter;

use crate::db::Value;
use crate::error::Result;
use crate::query::{QuerySpec, ResultRow};

/// One executed query: its specification and its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults {
    pub spec: QuerySpec,
    pub rows: Vec<ResultRow>,
}

impl QueryResults {
    pub fn new(spec: QuerySpec, rows: Vec<ResultRow>) -> Self {
        Self { spec, rows }
    }

    /// Aliases of the Date/Datetime fields, in projection order.
    pub fn date_aliases(&self) -> Vec<String> {
        self.spec
            .date_fields()
            .map(|field| field.alias.clone())
            .collect()
    }
}

/// Converts executed queries into one export format's body.
pub trait ResultFormatter: Send + Sync {
    /// Adjusts the specifications before they run.
    fn prepare(&self, _specs: &mut [QuerySpec]) {}

    /// Renders the complete body.
    fn render(&self, results: Vec<QueryResults>) -> Result<Vec<u8>>;
}

/// Splits List-typed fields into [`Value::List`] using each field's
/// delimiter. Values that are already lists are left alone; NULL and blank
/// values become empty lists.
pub fn split_list_fields(results: &mut QueryResults) {
    let lists: Vec<(String, String)> = results
        .spec
        .field_descriptions()
        .filter(|(_, description)| description.is_list)
        .map(|(alias, description)| (alias.to_string(), description.list_delimiter().to_string()))
        .collect();

    for row in &mut results.rows {
        for (alias, delimiter) in &lists {
            if let Some(value) = row.get_mut(alias) {
                *value = split_list_value(value, delimiter);
            }
        }
    }
}

fn split_list_value(value: &Value, delimiter: &str) -> Value {
    match value {
        Value::List(_) => value.clone(),
        _ if value.is_blank() => Value::List(Vec::new()),
        other => Value::List(
            other
                .to_cell_string(delimiter)
                .split(delimiter)
                .map(|member| Value::from(member.trim()))
                .collect(),
        ),
    }
}
