//! Builds [`QuerySpec`]s from loosely-typed request parameters.
//!
//! Building is pure: nothing touches the data store, so every rule here is
//! testable against an in-memory catalog.

use std::collections::HashSet;

use tracing::debug;

use crate::config::StoreConfig;
use crate::dates::precision_alias;
use crate::error::{ExportError, Result};
use crate::safety::{validate_clause, validate_statement};
use crate::schema::{FieldDescription, FieldType, SchemaCatalog, TableSchema};

use super::parse::{
    is_date_function, is_identifier, parse_aggregate, parse_column_ref, quote_ident,
    split_alias, split_top_level, Aggregate, ColumnRef,
};
use super::spec::{FieldRole, FieldSpec, JoinColumn, JoinCondition, QuerySpec, TableRef};

/// Field list used when a query names none.
pub const DEFAULT_FIELDS: &str = "_pageName";

/// Raw per-query parameters, exactly as the caller supplied them.
///
/// Empty strings mean "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub tables: String,
    pub fields: String,
    pub where_clause: String,
    pub join_on: String,
    pub group_by: String,
    pub having: String,
    pub order_by: String,
    pub limit: String,
    pub offset: String,
}

impl QueryParams {
    /// Parameters selecting `fields` from `tables`.
    pub fn new(tables: impl Into<String>, fields: impl Into<String>) -> Self {
        Self {
            tables: tables.into(),
            fields: fields.into(),
            ..Self::default()
        }
    }
}

/// Turns [`QueryParams`] into [`QuerySpec`]s resolved against a catalog.
pub struct QueryBuilder<'a> {
    catalog: &'a SchemaCatalog,
    table_prefix: String,
    default_limit: u64,
    max_limit: u64,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(catalog: &'a SchemaCatalog, store: &StoreConfig) -> Self {
        Self {
            catalog,
            table_prefix: store.table_prefix.clone(),
            default_limit: store.default_query_limit,
            max_limit: store.max_query_limit,
        }
    }

    /// Builds one specification per parameter set, preserving input order.
    pub fn build(&self, params: &[QueryParams]) -> Result<Vec<QuerySpec>> {
        params.iter().map(|p| self.build_one(p)).collect()
    }

    /// Builds a single specification.
    pub fn build_one(&self, params: &QueryParams) -> Result<QuerySpec> {
        let tables = self.resolve_tables(&params.tables)?;
        let join_conditions = resolve_joins(&tables, &params.join_on)?;

        let fields_text = if params.fields.trim().is_empty() {
            DEFAULT_FIELDS
        } else {
            params.fields.as_str()
        };
        let fields = resolve_fields(&tables, fields_text)?;

        for (clause, text) in [
            ("where", &params.where_clause),
            ("group_by", &params.group_by),
            ("having", &params.having),
            ("order_by", &params.order_by),
        ] {
            validate_clause(clause, text)?;
        }

        let limit = parse_count("limit", &params.limit)?
            .unwrap_or(self.default_limit)
            .min(self.max_limit);
        let offset = parse_count("offset", &params.offset)?;

        let spec = QuerySpec {
            tables: tables.iter().map(|t| t.table.clone()).collect(),
            fields,
            join_conditions,
            where_clause: params.where_clause.trim().to_string(),
            group_by: params.group_by.trim().to_string(),
            having: params.having.trim().to_string(),
            order_by: params.order_by.trim().to_string(),
            limit: Some(limit),
            offset,
            table_prefix: self.table_prefix.clone(),
        };

        validate_statement(&spec.to_sql())?;
        debug!(
            "Built query over {} table(s) with {} column(s)",
            spec.tables.len(),
            spec.fields.len()
        );
        Ok(spec)
    }

    /// Builds the query listing every visible field of `table` for one page.
    pub fn page_rows_spec(&self, table: &TableSchema, page_id: i64) -> QuerySpec {
        let table_ref = TableRef {
            name: table.name.clone(),
            alias: table.name.clone(),
        };

        let mut fields = Vec::new();
        let mut companions = Vec::new();
        for (name, description) in table.fields() {
            if description.is_hidden {
                continue;
            }
            fields.push(column_field(&table_ref.alias, name, name, description));
            if description.is_date() {
                companions.push(companion_field(&table_ref.alias, name, name));
            }
        }
        fields.extend(companions);

        QuerySpec {
            where_clause: format!(
                "{}.{} = {page_id}",
                quote_ident(&table_ref.alias),
                quote_ident("_pageID")
            ),
            tables: vec![table_ref],
            fields,
            join_conditions: Vec::new(),
            group_by: String::new(),
            having: String::new(),
            order_by: String::new(),
            limit: None,
            offset: None,
            table_prefix: self.table_prefix.clone(),
        }
    }

    fn resolve_tables(&self, text: &str) -> Result<Vec<ResolvedTable<'a>>> {
        let mut tables: Vec<ResolvedTable<'a>> = Vec::new();

        for item in split_top_level(text, ',') {
            let (name, alias) = split_alias(&item);
            let alias = alias.unwrap_or_else(|| name.clone());
            if !is_identifier(&name) || !is_identifier(&alias) {
                return Err(ExportError::configuration(format!(
                    "Invalid table reference \"{item}\""
                )));
            }
            if tables.iter().any(|t| t.table.alias == alias) {
                return Err(ExportError::configuration(format!(
                    "Table alias \"{alias}\" is used more than once"
                )));
            }
            let schema = self.catalog.require_table(&name)?;
            tables.push(ResolvedTable {
                table: TableRef { name, alias },
                schema,
            });
        }

        if tables.is_empty() {
            return Err(ExportError::configuration("No table specified"));
        }
        Ok(tables)
    }
}

struct ResolvedTable<'a> {
    table: TableRef,
    schema: &'a TableSchema,
}

/// A plain reference resolved to a concrete table column.
struct ResolvedColumn<'t> {
    table_alias: &'t str,
    field: String,
    description: FieldDescription,
}

fn resolve_column<'t>(
    tables: &'t [ResolvedTable<'_>],
    column: &ColumnRef,
) -> Result<ResolvedColumn<'t>> {
    let candidates: Vec<&ResolvedTable<'_>> = match &column.table {
        Some(alias) => {
            let table = tables
                .iter()
                .find(|t| &t.table.alias == alias)
                .ok_or_else(|| {
                    ExportError::configuration(format!(
                        "Table \"{alias}\" is not part of this query"
                    ))
                })?;
            vec![table]
        }
        None => tables.iter().collect(),
    };

    candidates
        .into_iter()
        .find_map(|t| {
            t.schema.field(&column.field).map(|description| ResolvedColumn {
                table_alias: t.table.alias.as_str(),
                field: column.field.clone(),
                description,
            })
        })
        .ok_or_else(|| match &column.table {
            Some(alias) => ExportError::configuration(format!(
                "Field \"{}\" does not exist in table \"{alias}\"",
                column.field
            )),
            None => ExportError::configuration(format!(
                "Field \"{}\" not found in any of the tables",
                column.field
            )),
        })
}

fn resolve_joins(tables: &[ResolvedTable<'_>], text: &str) -> Result<Vec<JoinCondition>> {
    validate_clause("join_on", text)?;

    let mut conditions = Vec::new();
    for item in split_top_level(text, ',') {
        let (left, right) = split_alias(&item);
        let parse_side = |side: &str| {
            parse_column_ref(side)
                .filter(|column| column.table.is_some())
                .ok_or_else(|| {
                    ExportError::configuration(format!(
                        "Invalid join condition \"{item}\"; expected table.field=table.field"
                    ))
                })
        };
        let left = parse_side(&left)?;
        let right = parse_side(right.as_deref().unwrap_or_default())?;

        let to_join_column = |column: &ColumnRef| -> Result<JoinColumn> {
            let resolved = resolve_column(tables, column)?;
            Ok(JoinColumn {
                table_alias: resolved.table_alias.to_string(),
                column: resolved.field,
            })
        };
        conditions.push(JoinCondition {
            left: to_join_column(&left)?,
            right: to_join_column(&right)?,
        });
    }

    // Every table after the first must be reached by some condition.
    for (index, table) in tables.iter().enumerate().skip(1) {
        let joined = conditions.iter().any(|c| {
            let left = tables.iter().position(|t| t.table.alias == c.left.table_alias);
            let right = tables.iter().position(|t| t.table.alias == c.right.table_alias);
            matches!((left, right), (Some(l), Some(r)) if l != r && l.max(r) == index)
        });
        if !joined {
            return Err(ExportError::configuration(format!(
                "Table \"{}\" must be joined to an earlier table with join_on",
                table.table.alias
            )));
        }
    }

    Ok(conditions)
}

fn resolve_fields(tables: &[ResolvedTable<'_>], text: &str) -> Result<Vec<FieldSpec>> {
    validate_clause("fields", text)?;

    let mut fields: Vec<FieldSpec> = Vec::new();
    let mut companions: Vec<FieldSpec> = Vec::new();
    let mut aliases = HashSet::new();

    for item in split_top_level(text, ',') {
        let (expression, alias) = split_alias(&item);

        let field = match parse_column_ref(&expression) {
            Some(column) => {
                let resolved = resolve_column(tables, &column)?;
                let alias = alias.unwrap_or_else(|| resolved.field.clone());
                if resolved.description.is_date() {
                    companions.push(companion_field(
                        resolved.table_alias,
                        &resolved.field,
                        &alias,
                    ));
                }
                column_field(
                    resolved.table_alias,
                    &resolved.field,
                    &alias,
                    &resolved.description,
                )
            }
            None => FieldSpec {
                description: computed_description(tables, &expression),
                alias: alias.unwrap_or_else(|| expression.clone()),
                expression,
                computed: true,
                role: FieldRole::Requested,
            },
        };

        if !aliases.insert(field.alias.clone()) {
            return Err(ExportError::configuration(format!(
                "Field alias \"{}\" is used more than once",
                field.alias
            )));
        }
        fields.push(field);
    }

    for companion in companions {
        if aliases.insert(companion.alias.clone()) {
            fields.push(companion);
        }
    }
    Ok(fields)
}

/// Derives the semantic type of a computed expression.
fn computed_description(tables: &[ResolvedTable<'_>], expression: &str) -> FieldDescription {
    if let Some((aggregate, column)) = parse_aggregate(expression) {
        let field_type = match aggregate {
            Aggregate::Count => FieldType::Integer,
            Aggregate::Sum | Aggregate::Avg => FieldType::Float,
            Aggregate::Min | Aggregate::Max => column
                .and_then(|column| resolve_column(tables, &column).ok())
                .map(|resolved| resolved.description.field_type)
                .unwrap_or(FieldType::String),
        };
        return FieldDescription::new(field_type);
    }
    if is_date_function(expression) {
        return FieldDescription::new(FieldType::Date);
    }
    FieldDescription::new(FieldType::String)
}

fn column_field(
    table_alias: &str,
    field: &str,
    alias: &str,
    description: &FieldDescription,
) -> FieldSpec {
    let column = if description.needs_full_column() {
        format!("{field}__full")
    } else {
        field.to_string()
    };
    FieldSpec {
        alias: alias.to_string(),
        expression: format!("{}.{}", quote_ident(table_alias), quote_ident(&column)),
        description: description.clone(),
        computed: false,
        role: FieldRole::Requested,
    }
}

fn companion_field(table_alias: &str, field: &str, alias: &str) -> FieldSpec {
    FieldSpec {
        alias: precision_alias(alias),
        expression: format!(
            "{}.{}",
            quote_ident(table_alias),
            quote_ident(&precision_alias(field))
        ),
        description: FieldDescription::new(FieldType::Integer),
        computed: false,
        role: FieldRole::PrecisionCompanion {
            date_alias: alias.to_string(),
        },
    }
}

fn parse_count(name: &str, text: &str) -> Result<Option<u64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| {
        ExportError::configuration(format!(
            "Error in \"{name}\" parameter: \"{text}\" is not a non-negative integer"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::new()
            .with_table(
                TableSchema::from_declarations(
                    "books",
                    &[
                        "title=String",
                        "author=Page",
                        "genres=List (;) of String",
                        "published=Date",
                        "location=Coordinates",
                        "pages=Integer",
                    ],
                )
                .unwrap(),
            )
            .with_table(
                TableSchema::from_declarations("authors", &["born=Date", "country=String"])
                    .unwrap(),
            )
    }

    fn build(params: QueryParams) -> Result<QuerySpec> {
        let catalog = catalog();
        let builder = QueryBuilder::new(&catalog, &StoreConfig::default());
        builder.build_one(&params)
    }

    #[test]
    fn test_build_preserves_input_order() {
        let catalog = catalog();
        let builder = QueryBuilder::new(&catalog, &StoreConfig::default());
        let specs = builder
            .build(&[
                QueryParams::new("authors", "country"),
                QueryParams::new("books", "title"),
            ])
            .unwrap();

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].tables[0].name, "authors");
        assert_eq!(specs[1].tables[0].name, "books");
    }

    #[test]
    fn test_plain_fields_resolve_and_alias() {
        let spec = build(QueryParams::new("books", "title=Book, pages")).unwrap();
        assert_eq!(spec.column_names(), vec!["Book", "pages"]);
        assert_eq!(spec.fields[0].expression, "\"books\".\"title\"");
        assert_eq!(spec.fields[1].description.field_type, FieldType::Integer);
    }

    #[test]
    fn test_list_and_coordinates_request_full_column() {
        let spec = build(QueryParams::new("books", "genres, location")).unwrap();
        assert_eq!(spec.fields[0].expression, "\"books\".\"genres__full\"");
        assert!(spec.fields[0].description.is_list);
        assert_eq!(spec.fields[1].expression, "\"books\".\"location__full\"");
    }

    #[test]
    fn test_date_fields_get_trailing_companions() {
        let spec = build(QueryParams::new("books", "published=Date published, title")).unwrap();
        assert_eq!(
            spec.column_names(),
            vec!["Date published", "title", "Date published__precision"]
        );
        assert_eq!(
            spec.fields[2].expression,
            "\"books\".\"published__precision\""
        );
        assert!(spec.has_precision_companion("Date published"));
    }

    #[test]
    fn test_computed_fields_are_typed_without_companions() {
        let spec = build(QueryParams {
            group_by: "author".to_string(),
            ..QueryParams::new(
                "books",
                "author, COUNT(*)=total, MAX(published)=latest, AVG(pages), DATE(published)=day",
            )
        })
        .unwrap();

        let types: Vec<FieldType> = spec
            .fields
            .iter()
            .map(|f| f.description.field_type)
            .collect();
        assert_eq!(
            types,
            vec![
                FieldType::Page,
                FieldType::Integer,
                FieldType::Date,
                FieldType::Float,
                FieldType::Date
            ]
        );
        assert!(spec.fields.iter().all(|f| !f.is_companion()));
        assert_eq!(spec.fields[3].alias, "AVG(pages)");
    }

    #[test]
    fn test_default_fields() {
        let spec = build(QueryParams::new("books", "")).unwrap();
        assert_eq!(spec.column_names(), vec!["_pageName"]);
    }

    #[test]
    fn test_unknown_field_is_configuration_error() {
        let err = build(QueryParams::new("books", "title, isbn")).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("isbn"));

        assert!(build(QueryParams::new("books", "authors.title")).is_err());
    }

    #[test]
    fn test_unknown_table_is_configuration_error() {
        let err = build(QueryParams::new("films", "title")).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        assert!(build(QueryParams::new("books", "title, author=title")).is_err());
    }

    #[test]
    fn test_join_composition() {
        let spec = build(QueryParams {
            join_on: "b.author=a._pageName".to_string(),
            ..QueryParams::new("books=b, authors=a", "b.title, a.country, born")
        })
        .unwrap();

        assert_eq!(spec.fields[2].expression, "\"a\".\"born\"");
        assert!(spec
            .to_sql()
            .contains("LEFT OUTER JOIN \"cargo__authors\" AS \"a\" ON \"b\".\"author\" = \"a\".\"_pageName\""));
    }

    #[test]
    fn test_unjoined_table_rejected() {
        let err = build(QueryParams::new("books, authors", "title")).unwrap_err();
        assert!(err.to_string().contains("join_on"));
    }

    #[test]
    fn test_limit_defaults_and_caps() {
        let spec = build(QueryParams::new("books", "title")).unwrap();
        assert_eq!(spec.limit, Some(100));

        let spec = build(QueryParams {
            limit: "999999".to_string(),
            offset: "20".to_string(),
            ..QueryParams::new("books", "title")
        })
        .unwrap();
        assert_eq!(spec.limit, Some(5000));
        assert_eq!(spec.offset, Some(20));

        assert!(build(QueryParams {
            limit: "-1".to_string(),
            ..QueryParams::new("books", "title")
        })
        .is_err());
    }

    #[test]
    fn test_unsafe_clauses_rejected() {
        for params in [
            QueryParams {
                where_clause: "1=1; DROP TABLE cargo__books".to_string(),
                ..QueryParams::new("books", "title")
            },
            QueryParams {
                order_by: "title -- comment".to_string(),
                ..QueryParams::new("books", "title")
            },
            QueryParams::new("books", "(SELECT 1)=x"),
        ] {
            assert!(matches!(build(params), Err(ExportError::Configuration(_))));
        }
    }

    #[test]
    fn test_page_rows_spec_skips_hidden_fields() {
        let catalog = SchemaCatalog::new();
        let builder = QueryBuilder::new(&catalog, &StoreConfig::default());
        let table =
            TableSchema::from_declarations("books", &["title=String", "secret=String (hidden)", "published=Date"])
                .unwrap();

        let spec = builder.page_rows_spec(&table, 42);
        assert_eq!(
            spec.column_names(),
            vec!["title", "published", "published__precision"]
        );
        assert_eq!(spec.where_clause, "\"books\".\"_pageID\" = 42");
        assert_eq!(spec.limit, None);
    }
}
