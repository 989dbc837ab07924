//! Localized user-facing messages.
//!
//! Every string shown to an end user comes from here so that a deployment
//! can translate them in the `[messages]` config section. `$1` marks the
//! parameter slot.

use serde::{Deserialize, Serialize};

/// Message catalog with English defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Shown when the requested export format is missing or unknown.
    pub missing_format: String,
    /// Placeholder for blank chart labels.
    pub none: String,
    /// Page-values heading; `$1` is the page name.
    pub page_values_for: String,
    /// Per-table heading in page values; `$1` is the table name.
    pub table_values: String,
    /// Shown when an export fails; `$1` is the error detail.
    pub query_error: String,
    pub yes: String,
    pub no: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            missing_format: "No valid format was specified for this query.".to_string(),
            none: "None".to_string(),
            page_values_for: "Page values for \"$1\"".to_string(),
            table_values: "Values for table \"$1\"".to_string(),
            query_error: "Error: $1".to_string(),
            yes: "Yes".to_string(),
            no: "No".to_string(),
        }
    }
}

impl Messages {
    /// Substitutes `arg` into the `$1` slot of `template`.
    pub fn with_arg(template: &str, arg: &str) -> String {
        template.replace("$1", arg)
    }

    pub fn page_values_for(&self, page_name: &str) -> String {
        Self::with_arg(&self.page_values_for, page_name)
    }

    pub fn table_values(&self, table_name: &str) -> String {
        Self::with_arg(&self.table_values, table_name)
    }

    pub fn query_error(&self, detail: &str) -> String {
        Self::with_arg(&self.query_error, detail)
    }

    /// Yes/No text for a boolean.
    pub fn boolean(&self, value: bool) -> &str {
        if value {
            &self.yes
        } else {
            &self.no
        }
    }
}
