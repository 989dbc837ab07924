//! Chart series (NVD3 style): first column as labels, one series per
//! remaining column.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::dates::{date_alias_of, format_date_value, DatePrecision};
use crate::db::Value;
use crate::error::Result;
use crate::query::ResultRow;

use super::encode::{encode_json, value_to_json, JsonOptions};
use super::{QueryResults, ResultFormatter};

/// Series colors, assigned by series position.
pub const SERIES_PALETTE: &[&str] = &[
    "#60BD68", "#FAA43A", "#5DA6DA", "#CC333F", "#F17CB0", "#B2912F", "#B276B2", "#DECF3F",
    "#F15854", "#4D4D4D",
];

/// Color of the series at `index`, cycling through the palette.
pub fn series_color(index: usize) -> &'static str {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

#[derive(Debug, Serialize)]
struct Point {
    label: JsonValue,
    value: JsonValue,
}

#[derive(Debug, Serialize)]
struct Series {
    key: String,
    color: &'static str,
    values: Vec<Point>,
}

/// Renders the first query as chart series.
#[derive(Debug, Clone)]
pub struct ChartFormatter {
    /// Label used for blank categories.
    none_label: String,
    american_dates: bool,
}

impl ChartFormatter {
    pub fn new(none_label: impl Into<String>, american_dates: bool) -> Self {
        Self {
            none_label: none_label.into(),
            american_dates,
        }
    }

    /// Rewrites each date that has a precision companion as display text
    /// and drops the companion.
    fn fold_precision_columns(&self, row: &mut ResultRow) {
        let companions: Vec<(String, String)> = row
            .keys()
            .filter_map(|key| date_alias_of(key).map(|date| (key.to_string(), date.to_string())))
            .collect();

        for (companion, date_alias) in companions {
            let precision = DatePrecision::from_value(row.get(&companion));
            let Some(date) = row.get_mut(&date_alias) else {
                continue;
            };
            // A trailing space keeps bare years from being read as numbers.
            let text = format_date_value(date, precision, false, self.american_dates);
            *date = Value::String(format!("{text} "));
            row.remove(&companion);
        }
    }
}

impl ResultFormatter for ChartFormatter {
    fn render(&self, results: Vec<QueryResults>) -> Result<Vec<u8>> {
        let mut rows = results
            .into_iter()
            .next()
            .map(|query| query.rows)
            .unwrap_or_default();
        for row in &mut rows {
            self.fold_precision_columns(row);
        }

        let mut series: Vec<Series> = rows
            .first()
            .map(|first| {
                first
                    .keys()
                    .skip(1)
                    .enumerate()
                    .map(|(index, key)| Series {
                        key: key.to_string(),
                        color: series_color(index),
                        values: Vec::new(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        for row in &rows {
            let label = match row.first() {
                Some((_, value)) if !value.is_blank() => value_to_json(value),
                _ => JsonValue::String(self.none_label.clone()),
            };
            for (series, (_, value)) in series.iter_mut().zip(row.iter().skip(1)) {
                series.values.push(Point {
                    label: label.clone(),
                    value: value_to_json(value),
                });
            }
        }

        encode_json(&series, JsonOptions::NUMERIC)
    }
}
