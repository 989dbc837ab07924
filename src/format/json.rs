//! Flat JSON rows from every query.

use serde_json::{Map, Value as JsonValue};

use crate::db::Value;
use crate::error::Result;
use crate::schema::FieldType;

use super::encode::{encode_json, value_to_json, JsonOptions};
use super::{split_list_fields, QueryResults, ResultFormatter};

/// Renders all rows of all queries as one pretty-printed array.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

/// Unpacks a `"lat, lon"` coordinates value into `{"lat": .., "lon": ..}`.
fn coordinates_to_json(value: &Value) -> JsonValue {
    let text = value.to_cell_string(",");
    let parsed = text.split_once(',').and_then(|(lat, lon)| {
        let lat: f64 = lat.trim().parse().ok()?;
        let lon: f64 = lon.trim().parse().ok()?;
        Some(serde_json::json!({ "lat": lat, "lon": lon }))
    });
    parsed.unwrap_or_else(|| value_to_json(value))
}

impl ResultFormatter for JsonFormatter {
    fn render(&self, mut results: Vec<QueryResults>) -> Result<Vec<u8>> {
        let mut rows: Vec<JsonValue> = Vec::new();

        for query in &mut results {
            split_list_fields(query);
            let coordinates: Vec<&str> = query
                .spec
                .field_descriptions()
                .filter(|(_, d)| !d.is_list && d.field_type == FieldType::Coordinates)
                .map(|(alias, _)| alias)
                .collect();

            for row in &query.rows {
                let object: Map<String, JsonValue> = row
                    .iter()
                    .map(|(alias, value)| {
                        let json = if coordinates.contains(&alias) && !value.is_blank() {
                            coordinates_to_json(value)
                        } else {
                            value_to_json(value)
                        };
                        (alias.to_string(), json)
                    })
                    .collect();
                rows.push(JsonValue::Object(object));
            }
        }

        encode_json(&rows, JsonOptions::NUMERIC_PRETTY)
    }
}
