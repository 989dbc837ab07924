//! Page values: every stored row for one page, rendered as key/value
//! tables, one per source table.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::dates::{format_date_value, precision_alias, DatePrecision};
use crate::db::{DataStore, Value};
use crate::error::Result;
use crate::format::markup::escape_html;
use crate::messages::Messages;
use crate::query::{QueryBuilder, QueryExecutor, ResultRow};
use crate::schema::{FieldDescription, FieldType, SchemaCatalog, TableSchema};
use crate::site::PageLinker;

/// Built-in table holding per-page metadata.
pub const PAGE_DATA_TABLE: &str = "_pageData";
/// Built-in table holding per-file metadata.
pub const FILE_DATA_TABLE: &str = "_fileData";

const FULL_TEXT_FIELD: &str = "_fullText";
const FULL_TEXT_DISPLAY_LIMIT: usize = 300;
const LIST_SEPARATOR: &str = " \u{2022} ";

/// The page whose values are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: i64,
    pub name: String,
}

impl PageRef {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One displayed row: field name and display HTML, in field order.
pub type DisplayRow = Vec<(String, String)>;

/// Rows of one table for the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableValues {
    pub table: String,
    pub rows: Vec<DisplayRow>,
}

/// Everything stored for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageValuesReport {
    pub title: String,
    pub tables: Vec<TableValues>,
    table_heading: String,
}

impl PageValuesReport {
    /// Renders the page title, then a heading and one info table per row
    /// for every source table.
    pub fn render_html(&self) -> String {
        let mut html = format!("<h1>{}</h1>\n", escape_html(&self.title));
        for table in &self.tables {
            html.push_str(&format!(
                "<h2>{}</h2>\n",
                escape_html(&Messages::with_arg(&self.table_heading, &table.table))
            ));
            for row in &table.rows {
                html.push_str("<table class=\"wikitable mw-page-info\">");
                for (field, value) in row {
                    html.push_str(&format!(
                        "<tr><td style=\"vertical-align: top;\">{}</td><td>{value}</td></tr>",
                        escape_html(field)
                    ));
                }
                html.push_str("</table>\n");
            }
        }
        html
    }
}

/// Declared type of a built-in page/file data column.
fn builtin_field(name: &str) -> FieldDescription {
    match name {
        "_creationDate" | "_modificationDate" | "_lastUploadDate" => {
            FieldDescription::new(FieldType::Datetime)
        }
        "_fullText" => FieldDescription::new(FieldType::Searchtext),
        "_categories" => FieldDescription::list(FieldType::String, "|"),
        "_numRevisions" | "_numPages" => FieldDescription::new(FieldType::Integer),
        "_isRedirect" => FieldDescription::new(FieldType::Boolean),
        "_pageNameOrRedirect" => FieldDescription::new(FieldType::Page),
        _ => FieldDescription::new(FieldType::String),
    }
}

fn builtin_table(name: &str, columns: &[String]) -> TableSchema {
    columns.iter().fold(TableSchema::new(name), |table, column| {
        let column = format!("_{}", column.trim_start_matches('_'));
        let description = builtin_field(&column);
        table.with_field(column, description)
    })
}

/// Reads and formats the values stored for a page.
pub struct PageValues<'a> {
    catalog: &'a SchemaCatalog,
    store: &'a dyn DataStore,
    config: &'a Config,
    linker: PageLinker,
}

impl<'a> PageValues<'a> {
    pub fn new(catalog: &'a SchemaCatalog, store: &'a dyn DataStore, config: &'a Config) -> Self {
        Self {
            catalog,
            store,
            config,
            linker: PageLinker::new(&config.site),
        }
    }

    /// Schema of a declared table or of a built-in page/file data table.
    pub fn table_schema(&self, table: &str) -> Result<TableSchema> {
        match table {
            PAGE_DATA_TABLE => Ok(builtin_table(
                PAGE_DATA_TABLE,
                &self.config.page_data.page_data_columns,
            )),
            FILE_DATA_TABLE => Ok(builtin_table(
                FILE_DATA_TABLE,
                &self.config.page_data.file_data_columns,
            )),
            _ => self.catalog.require_table(table).cloned(),
        }
    }

    /// Tables to show for a page: the built-in tables when they hold
    /// columns, then every table the page stored rows in.
    pub async fn table_names(&self, page_id: i64) -> Vec<String> {
        let mut names = Vec::new();
        if !self.config.page_data.page_data_columns.is_empty() {
            names.push(PAGE_DATA_TABLE.to_string());
        }
        if !self.config.page_data.file_data_columns.is_empty() {
            names.push(FILE_DATA_TABLE.to_string());
        }

        let sql = format!("SELECT table_name FROM cargo_pages WHERE page_id = {page_id}");
        match self.store.execute_query(&sql).await {
            Ok(result) => names.extend(
                result
                    .rows
                    .iter()
                    .filter_map(|row| row.first())
                    .map(|value| value.to_cell_string(""))
                    .filter(|name| !name.is_empty()),
            ),
            Err(e) => warn!("Could not list tables for page {}: {}", page_id, e),
        }
        names
    }

    /// Display rows stored in `table` for the page, precision companions
    /// and hidden fields omitted.
    pub async fn get_rows_for_page_in_table(
        &self,
        table: &str,
        page_id: i64,
    ) -> Result<Vec<DisplayRow>> {
        let schema = self.table_schema(table)?;
        let spec = QueryBuilder::new(self.catalog, &self.config.store).page_rows_spec(&schema, page_id);
        let executor = QueryExecutor::new(
            self.store,
            Duration::from_secs(self.config.store.query_timeout_secs),
        );
        let rows = executor.run(&spec).await?;

        let fields: Vec<(String, FieldDescription)> = spec
            .field_descriptions()
            .map(|(alias, description)| (alias.to_string(), description.clone()))
            .collect();

        Ok(rows
            .iter()
            .map(|row| {
                fields
                    .iter()
                    .map(|(alias, description)| {
                        (alias.clone(), self.display_value(row, alias, description))
                    })
                    .collect()
            })
            .collect())
    }

    /// Collects every table's rows for the page; tables that fail to load
    /// are skipped.
    pub async fn collect(&self, page: &PageRef) -> PageValuesReport {
        let mut tables = Vec::new();
        for table in self.table_names(page.id).await {
            match self.get_rows_for_page_in_table(&table, page.id).await {
                Ok(rows) => tables.push(TableValues { table, rows }),
                Err(e) => warn!("Skipping table \"{}\": {}", table, e),
            }
        }
        debug!("Collected {} table(s) for page {}", tables.len(), page.id);

        PageValuesReport {
            title: self.config.messages.page_values_for(&page.name),
            tables,
            table_heading: self.config.messages.table_values.clone(),
        }
    }

    fn display_value(&self, row: &ResultRow, alias: &str, description: &FieldDescription) -> String {
        let Some(value) = row.get(alias) else {
            return String::new();
        };
        if value.is_blank() {
            return String::new();
        }

        if description.is_date() {
            let precision = DatePrecision::from_value(row.get(&precision_alias(alias)));
            let with_time = description.field_type == FieldType::Datetime;
            return escape_html(&format_date_value(
                value,
                precision,
                with_time,
                self.config.site.american_dates,
            ));
        }

        if description.is_list {
            let delimiter = description.list_delimiter();
            return value
                .to_cell_string(delimiter)
                .split(delimiter)
                .map(str::trim)
                .filter(|member| !member.is_empty())
                .map(|member| self.display_scalar(&Value::from(member), description.field_type))
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR);
        }

        if alias == FULL_TEXT_FIELD {
            let text = value.to_cell_string(", ");
            if text.chars().count() > FULL_TEXT_DISPLAY_LIMIT {
                let truncated: String = text.chars().take(FULL_TEXT_DISPLAY_LIMIT).collect();
                return escape_html(&format!("{truncated} ..."));
            }
        }

        self.display_scalar(value, description.field_type)
    }

    fn display_scalar(&self, value: &Value, field_type: FieldType) -> String {
        let text = value.to_cell_string(", ");
        match field_type {
            FieldType::Boolean => match value.as_i64() {
                Some(flag) => self.config.messages.boolean(flag != 0).to_string(),
                None => escape_html(&text),
            },
            FieldType::Page => match self.linker.local_url(&text) {
                Some(url) => format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(&url),
                    escape_html(&text)
                ),
                None => escape_html(&text),
            },
            _ => escape_html(&text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageDataConfig;
    use crate::db::{FailingStore, MockStore};
    use pretty_assertions::assert_eq;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new().with_table(
            TableSchema::from_declarations(
                "books",
                &[
                    "title=String",
                    "author=Page",
                    "genres=List (,) of String",
                    "published=Date",
                    "in_print=Boolean",
                    "notes=String (hidden)",
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_builtin_tables_use_configured_columns() {
        let config = Config {
            page_data: PageDataConfig {
                page_data_columns: vec!["creationDate".to_string(), "_fullText".to_string()],
                file_data_columns: Vec::new(),
            },
            ..Config::default()
        };
        let (catalog, store) = (catalog(), MockStore::new());
        let values = PageValues::new(&catalog, &store, &config);

        let schema = values.table_schema(PAGE_DATA_TABLE).unwrap();
        let fields: Vec<(&str, FieldType)> = schema
            .fields()
            .map(|(name, d)| (name, d.field_type))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("_creationDate", FieldType::Datetime),
                ("_fullText", FieldType::Searchtext)
            ]
        );
        assert!(values.table_schema("films").is_err());
    }

    #[tokio::test]
    async fn test_rows_are_display_formatted() {
        let (catalog, config) = (catalog(), Config::default());
        let store = MockStore::new().with_response(
            "cargo__books",
            vec![vec![
                Value::from("Dune <1>"),
                Value::from("Frank Herbert"),
                Value::from("sci-fi, classic"),
                Value::from("1965-08-01"),
                Value::from(1),
                Value::from(2),
            ]],
        );
        let values = PageValues::new(&catalog, &store, &config);

        let rows = values.get_rows_for_page_in_table("books", 7).await.unwrap();

        assert_eq!(
            rows,
            vec![vec![
                ("title".to_string(), "Dune &lt;1&gt;".to_string()),
                (
                    "author".to_string(),
                    "<a href=\"/index.php?title=Frank_Herbert\">Frank Herbert</a>".to_string()
                ),
                ("genres".to_string(), "sci-fi \u{2022} classic".to_string()),
                ("published".to_string(), "August 1965".to_string()),
                ("in_print".to_string(), "Yes".to_string()),
            ]]
        );
        assert!(store.executed()[0].contains("\"books\".\"_pageID\" = 7"));
    }

    #[tokio::test]
    async fn test_failed_tables_are_skipped() {
        let (catalog, config) = (catalog(), Config::default());
        let store = FailingStore::new("no such table: cargo_pages");
        let values = PageValues::new(&catalog, &store, &config);

        let report = values.collect(&PageRef::new(7, "Dune")).await;

        assert!(report.tables.is_empty());
        assert_eq!(report.title, "Page values for \"Dune\"");
    }

    #[test]
    fn test_render_html() {
        let report = PageValuesReport {
            title: "Page values for \"Dune\"".to_string(),
            tables: vec![TableValues {
                table: "books".to_string(),
                rows: vec![vec![("title".to_string(), "Dune".to_string())]],
            }],
            table_heading: "Values for table \"$1\"".to_string(),
        };

        assert_eq!(
            report.render_html(),
            "<h1>Page values for &quot;Dune&quot;</h1>\n\
             <h2>Values for table &quot;books&quot;</h2>\n\
             <table class=\"wikitable mw-page-info\"><tr><td style=\"vertical-align: top;\">title</td><td>Dune</td></tr></table>\n"
        );
    }
}
