//! Timeline events, globally sorted by start.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::db::Value;
use crate::error::Result;
use crate::query::ResultRow;
use crate::site::PageLinker;

use super::encode::{encode_json, value_to_json, JsonOptions};
use super::rules::FieldRule;
use super::{QueryResults, ResultFormatter};

#[derive(Debug, Serialize)]
struct TimelineEvent {
    title: JsonValue,
    start: JsonValue,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
}

#[derive(Debug, Serialize)]
struct Timeline {
    events: Vec<TimelineEvent>,
}

/// Renders rows from every query as one timeline.
#[derive(Debug, Clone)]
pub struct TimelineFormatter {
    linker: PageLinker,
}

impl TimelineFormatter {
    pub fn new(linker: PageLinker) -> Self {
        Self { linker }
    }
}

/// HTML summary of every field except the first and the date fields.
fn describe(query: &QueryResults, row: &ResultRow, date_aliases: &[String]) -> String {
    let mut description = String::new();
    for (alias, field) in query.spec.field_descriptions().skip(1) {
        if date_aliases.iter().any(|date| date == alias) {
            continue;
        }
        let Some(value) = row.get(alias) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        let text = value.to_cell_string(field.list_delimiter());
        description.push_str(&format!("<strong>{alias}:</strong> {text}<br />\n"));
    }
    description
}

impl ResultFormatter for TimelineFormatter {
    fn render(&self, results: Vec<QueryResults>) -> Result<Vec<u8>> {
        let mut events: Vec<(Value, TimelineEvent)> = Vec::new();

        for query in &results {
            let date_aliases = query.date_aliases();
            for row in &query.rows {
                let start = FieldRule::FIRST_DATE
                    .resolve(row, &date_aliases)
                    .cloned()
                    .unwrap_or_default();
                let event = TimelineEvent {
                    title: FieldRule::TITLE
                        .resolve(row, &date_aliases)
                        .map(value_to_json)
                        .unwrap_or(JsonValue::Null),
                    start: value_to_json(&start),
                    description: describe(query, row, &date_aliases),
                    link: row
                        .get("_pageName")
                        .and_then(|name| self.linker.full_url(&name.to_cell_string(","))),
                };
                events.push((start, event));
            }
        }

        // Stable, so equal starts keep query order then row order.
        events.sort_by(|(a, _), (b, _)| a.sort_cmp(b));

        let timeline = Timeline {
            events: events.into_iter().map(|(_, event)| event).collect(),
        };
        encode_json(&timeline, JsonOptions::HTML_SAFE)
    }
}
