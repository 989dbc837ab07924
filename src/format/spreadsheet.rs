//! Spreadsheet output as SpreadsheetML 2003 XML, which spreadsheet
//! applications open as an `.xls` workbook.

use crate::db::Value;
use crate::error::Result;

use super::encode::parse_numeric;
use super::markup::escape_html;
use super::{QueryResults, ResultFormatter};

const WORKBOOK_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<?mso-application progid=\"Excel.Sheet\"?>\n",
    "<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\" ",
    "xmlns:ss=\"urn:schemas-microsoft-com:office:spreadsheet\">\n",
    " <Worksheet ss:Name=\"Results\">\n",
    "  <Table>\n",
);

const WORKBOOK_FOOTER: &str = "  </Table>\n </Worksheet>\n</Workbook>\n";

/// Renders the first query as a single worksheet: a header row, then one
/// row per result row with raw values.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetFormatter;

impl SpreadsheetFormatter {
    pub fn new() -> Self {
        Self
    }
}

fn data_cell(cell_type: &str, text: &str) -> String {
    format!(
        "    <Cell><Data ss:Type=\"{cell_type}\">{}</Data></Cell>\n",
        escape_html(text)
    )
}

fn value_cell(value: &Value) -> String {
    match value {
        Value::Null => "    <Cell/>\n".to_string(),
        Value::Int(i) => data_cell("Number", &i.to_string()),
        Value::Float(f) if f.is_finite() => data_cell("Number", &f.to_string()),
        Value::Bool(b) => data_cell("Boolean", if *b { "1" } else { "0" }),
        Value::String(s) if parse_numeric(s).is_some() => data_cell("Number", s),
        other => data_cell("String", &other.to_cell_string(", ")),
    }
}

impl ResultFormatter for SpreadsheetFormatter {
    fn render(&self, results: Vec<QueryResults>) -> Result<Vec<u8>> {
        let mut out = String::from(WORKBOOK_HEADER);

        if let Some(query) = results.first() {
            out.push_str("   <Row>\n");
            for header in query.spec.column_names() {
                out.push_str(&data_cell("String", &header));
            }
            out.push_str("   </Row>\n");

            for row in &query.rows {
                out.push_str("   <Row>\n");
                for (_, value) in row.iter() {
                    out.push_str(&value_cell(value));
                }
                out.push_str("   </Row>\n");
            }
        }

        out.push_str(WORKBOOK_FOOTER);
        Ok(out.into_bytes())
    }
}
