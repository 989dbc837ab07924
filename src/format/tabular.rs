//! CSV output over the union of all queries' columns.

use std::collections::HashMap;

use csv::WriterBuilder;

use crate::error::{ExportError, Result};

use super::{split_list_fields, QueryResults, ResultFormatter};

/// Renders every query into one CSV document.
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    delimiter: u8,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvFormatter {
    /// Uses `delimiter` between cells. The two-character escape `\t` means
    /// a tab; anything that is not a single ASCII character falls back to a
    /// comma.
    pub fn new(delimiter: &str) -> Self {
        let delimiter = match delimiter {
            "\\t" => b'\t',
            text if text.len() == 1 && text.is_ascii() => text.as_bytes()[0],
            _ => b',',
        };
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

/// Column names of all queries, duplicates removed, in first-seen order.
fn union_headers(results: &[QueryResults]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for query in results {
        for column in query.spec.column_names() {
            if !headers.contains(&column) {
                headers.push(column);
            }
        }
    }
    headers
}

impl ResultFormatter for CsvFormatter {
    fn render(&self, mut results: Vec<QueryResults>) -> Result<Vec<u8>> {
        let headers = union_headers(&results);

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());
        writer.write_record(&headers)?;

        for query in &mut results {
            split_list_fields(query);
            let delimiters: HashMap<&str, &str> = query
                .spec
                .field_descriptions()
                .filter(|(_, description)| description.is_list)
                .map(|(alias, description)| (alias, description.list_delimiter()))
                .collect();

            for row in &query.rows {
                let record: Vec<String> = headers
                    .iter()
                    .map(|header| match row.get(header) {
                        Some(value) => {
                            let delimiter = delimiters.get(header.as_str()).copied().unwrap_or(",");
                            value.to_cell_string(delimiter)
                        }
                        None => String::new(),
                    })
                    .collect();
                writer.write_record(&record)?;
            }
        }

        writer
            .into_inner()
            .map_err(|e| ExportError::encoding(format!("Failed to finish CSV output: {e}")))
    }
}
