//! Export request parsing.
//!
//! Per-query parameters arrive as parallel-indexed arrays: `tables[0]`
//! goes with `fields[0]`, `where[0]` and so on. `name[]` appends, `name[i]`
//! sets slot `i`, and a plain `name` is a one-element array.

use std::collections::{BTreeMap, HashMap};

use url::form_urlencoded;

use crate::query::QueryParams;

/// Decoded request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    values: HashMap<String, BTreeMap<usize, String>>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string. A
    /// leading `?` is ignored.
    pub fn from_query_string(query: &str) -> Self {
        let mut params = Self::new();
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.insert(&key, value.into_owned());
        }
        params
    }

    /// Adds one `key=value` pair, honoring the array key forms.
    pub fn insert(&mut self, key: &str, value: String) {
        let (name, slot) = match key.split_once('[') {
            Some((name, rest)) => (name, Some(rest.trim_end_matches(']'))),
            None => (key, None),
        };
        let slots = self.values.entry(name.to_string()).or_default();
        let index = match slot {
            Some("") => slots.keys().next_back().map_or(0, |last| last + 1),
            Some(index) => match index.parse() {
                Ok(index) => index,
                Err(_) => return,
            },
            None => 0,
        };
        slots.insert(index, value);
    }

    /// All slots of an array parameter, in index order.
    pub fn array(&self, name: &str) -> Option<&BTreeMap<usize, String>> {
        self.values.get(name).filter(|slots| !slots.is_empty())
    }

    /// Slot `index` of an array parameter.
    pub fn indexed(&self, name: &str, index: usize) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|slots| slots.get(&index))
            .map(String::as_str)
    }

    /// A scalar parameter; for arrays, the lowest slot.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.array(name)
            .and_then(|slots| slots.values().next())
            .map(String::as_str)
    }

    /// A scalar parameter, treating blank values as absent.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.value(name).filter(|value| !value.trim().is_empty())
    }
}

/// Everything one export invocation needs, fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRequest {
    /// Per-query parameters in slot order.
    pub queries: Vec<QueryParams>,
    /// Requested format name as given; unknown names are reported later.
    pub format: Option<String>,
    /// Per-query calendar colors, aligned with `queries`.
    pub colors: Vec<Option<String>>,
    pub text_colors: Vec<Option<String>>,
    /// Calendar window bounds.
    pub start: Option<String>,
    pub end: Option<String>,
    /// CSV delimiter as given.
    pub delimiter: Option<String>,
    /// Download filename for file-like formats.
    pub filename: Option<String>,
}

impl ExportRequest {
    pub fn from_query_string(query: &str) -> Self {
        Self::from_params(&RequestParams::from_query_string(query))
    }

    /// Builds the request; `tables` falls back to `table`.
    pub fn from_params(params: &RequestParams) -> Self {
        let table_param = if params.array("tables").is_some() {
            "tables"
        } else {
            "table"
        };

        let slots: Vec<usize> = params
            .array(table_param)
            .map(|tables| tables.keys().copied().collect())
            .unwrap_or_default();

        let per_query = |name: &str, index: usize| -> String {
            params.indexed(name, index).unwrap_or_default().to_string()
        };
        let optional = |name: &str, index: usize| -> Option<String> {
            params
                .indexed(name, index)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        };

        let queries = slots
            .iter()
            .map(|&i| QueryParams {
                tables: per_query(table_param, i),
                fields: per_query("fields", i),
                where_clause: per_query("where", i),
                join_on: per_query("join_on", i),
                group_by: per_query("group_by", i),
                having: per_query("having", i),
                order_by: per_query("order_by", i),
                limit: per_query("limit", i),
                offset: per_query("offset", i),
            })
            .collect();

        Self {
            queries,
            format: params.value("format").map(str::to_string),
            colors: slots.iter().map(|&i| optional("color", i)).collect(),
            text_colors: slots.iter().map(|&i| optional("text_color", i)).collect(),
            start: params.non_blank("start").map(str::to_string),
            end: params.non_blank("end").map(str::to_string),
            delimiter: params.non_blank("delimiter").map(str::to_string),
            filename: params.non_blank("filename").map(str::to_string),
        }
    }
}
