//! Calendar events for a FullCalendar-style consumer.

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::dates::{precision_alias, DatePrecision};
use crate::error::Result;
use crate::query::QuerySpec;
use crate::site::PageLinker;

use super::encode::{encode_json, value_to_json, JsonOptions};
use super::rules::FieldRule;
use super::{QueryResults, ResultFormatter};

const START_FIELD: &str = "start";

#[derive(Debug, Serialize)]
struct CalendarEvent {
    title: JsonValue,
    start: JsonValue,
    end: JsonValue,
    color: JsonValue,
    #[serde(rename = "textColor")]
    text_color: JsonValue,
    description: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(rename = "allDay", skip_serializing_if = "Option::is_none")]
    all_day: Option<bool>,
}

/// Renders rows as calendar events, restricted to a date window.
#[derive(Debug, Clone)]
pub struct CalendarFormatter {
    /// Per-query default colors, indexed by query position.
    pub colors: Vec<Option<String>>,
    pub text_colors: Vec<Option<String>>,
    /// Inclusive window bounds; the filter is only injected when both are
    /// present.
    pub start: Option<String>,
    pub end: Option<String>,
    linker: PageLinker,
}

impl CalendarFormatter {
    pub fn new(linker: PageLinker) -> Self {
        Self {
            colors: Vec::new(),
            text_colors: Vec::new(),
            start: None,
            end: None,
            linker,
        }
    }

    pub fn with_colors(
        mut self,
        colors: Vec<Option<String>>,
        text_colors: Vec<Option<String>>,
    ) -> Self {
        self.colors = colors;
        self.text_colors = text_colors;
        self
    }

    pub fn with_window(mut self, start: Option<String>, end: Option<String>) -> Self {
        self.start = start;
        self.end = end;
        self
    }
}

fn query_default(values: &[Option<String>], index: usize) -> JsonValue {
    values
        .get(index)
        .and_then(Option::clone)
        .map(JsonValue::String)
        .unwrap_or(JsonValue::Null)
}

impl ResultFormatter for CalendarFormatter {
    fn prepare(&self, specs: &mut [QuerySpec]) {
        let (Some(start), Some(end)) = (&self.start, &self.end) else {
            return;
        };
        for spec in specs.iter_mut() {
            if let Some(condition) = spec.date_range_condition(start, end) {
                spec.add_where_condition(&condition);
            }
        }
    }

    fn render(&self, results: Vec<QueryResults>) -> Result<Vec<u8>> {
        let mut events = Vec::new();

        for (index, query) in results.iter().enumerate() {
            let date_aliases = query.date_aliases();

            for row in &query.rows {
                // Precision of whichever column supplied the start.
                let start_precision_alias = if row.contains(START_FIELD) {
                    Some(precision_alias(START_FIELD))
                } else {
                    date_aliases.first().map(|alias| precision_alias(alias))
                };
                let resolve = |rule: FieldRule| {
                    rule.resolve(row, &date_aliases)
                        .map(value_to_json)
                        .unwrap_or(JsonValue::Null)
                };

                let precision = DatePrecision::from_value(
                    start_precision_alias
                        .as_deref()
                        .and_then(|alias| row.get(alias)),
                );

                events.push(CalendarEvent {
                    title: resolve(FieldRule::TITLE),
                    start: resolve(FieldRule::START),
                    end: resolve(FieldRule::END),
                    color: FieldRule::COLOR
                        .resolve(row, &date_aliases)
                        .map(value_to_json)
                        .unwrap_or_else(|| query_default(&self.colors, index)),
                    text_color: FieldRule::TEXT_COLOR
                        .resolve(row, &date_aliases)
                        .map(value_to_json)
                        .unwrap_or_else(|| query_default(&self.text_colors, index)),
                    description: resolve(FieldRule::DESCRIPTION),
                    url: row
                        .get("_pageName")
                        .and_then(|name| self.linker.local_url(&name.to_cell_string(","))),
                    all_day: (precision != DatePrecision::DateAndTime).then_some(true),
                });
            }
        }

        debug!("Rendered {} calendar events", events.len());
        encode_json(&events, JsonOptions::PLAIN)
    }
}
