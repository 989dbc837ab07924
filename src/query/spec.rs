//! Store-agnostic query specifications.

use crate::dates::precision_alias;
use crate::schema::FieldDescription;

use super::parse::{quote_ident, sql_literal};

/// A table taking part in a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    /// Declared table name.
    pub name: String,
    /// Alias used by field expressions and clauses.
    pub alias: String,
}

/// Why a column is in the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    /// Requested by the caller.
    Requested,
    /// Precision companion of the named date alias.
    PrecisionCompanion { date_alias: String },
}

/// One projected column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub alias: String,
    /// SQL expression producing the column.
    pub expression: String,
    pub description: FieldDescription,
    /// Computed expressions (aggregates, function calls) rather than a plain
    /// column; these never get a precision companion.
    pub computed: bool,
    pub role: FieldRole,
}

impl FieldSpec {
    pub fn is_companion(&self) -> bool {
        matches!(self.role, FieldRole::PrecisionCompanion { .. })
    }
}

/// A column on one side of a join condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinColumn {
    pub table_alias: String,
    pub column: String,
}

impl JoinColumn {
    fn to_sql(&self) -> String {
        format!("{}.{}", quote_ident(&self.table_alias), quote_ident(&self.column))
    }
}

/// An equality join `left = right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    pub left: JoinColumn,
    pub right: JoinColumn,
}

/// A fully resolved query.
///
/// Field aliases are unique, and the projection lists requested fields in
/// request order followed by precision companions.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub tables: Vec<TableRef>,
    pub fields: Vec<FieldSpec>,
    pub join_conditions: Vec<JoinCondition>,
    pub where_clause: String,
    pub group_by: String,
    pub having: String,
    pub order_by: String,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// Prefix of the physical table names.
    pub table_prefix: String,
}

impl QuerySpec {
    /// Requested fields with their descriptions, in projection order.
    pub fn field_descriptions(&self) -> impl Iterator<Item = (&str, &FieldDescription)> {
        self.fields
            .iter()
            .filter(|field| !field.is_companion())
            .map(|field| (field.alias.as_str(), &field.description))
    }

    /// Requested Date/Datetime fields, in projection order.
    pub fn date_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(|field| !field.is_companion() && field.description.is_date())
    }

    /// Every projected alias, companions included, in projection order.
    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|field| field.alias.clone()).collect()
    }

    pub fn field(&self, alias: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.alias == alias)
    }

    /// True when `alias` has a precision companion in the projection.
    pub fn has_precision_companion(&self, alias: &str) -> bool {
        self.field(&precision_alias(alias))
            .is_some_and(FieldSpec::is_companion)
    }

    /// AND-combines `condition` with the existing filter.
    pub fn add_where_condition(&mut self, condition: &str) {
        self.where_clause = if self.where_clause.trim().is_empty() {
            condition.to_string()
        } else {
            format!("({}) AND {}", self.where_clause, condition)
        };
    }

    /// Condition requiring at least one plain date field to fall inside
    /// `[start, end]`, compared as text; `None` when there is no such field.
    pub fn date_range_condition(&self, start: &str, end: &str) -> Option<String> {
        let (start, end) = (sql_literal(start), sql_literal(end));
        let ranges: Vec<String> = self
            .date_fields()
            .filter(|field| !field.computed)
            .map(|field| {
                format!(
                    "({expr} >= {start} AND {expr} <= {end})",
                    expr = field.expression
                )
            })
            .collect();
        (!ranges.is_empty()).then(|| format!("({})", ranges.join(" OR ")))
    }

    /// Physical name of a declared table.
    pub fn physical_table(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }

    /// Renders the specification as a single SELECT statement.
    pub fn to_sql(&self) -> String {
        let projection = self
            .fields
            .iter()
            .map(|field| format!("{} AS {}", field.expression, quote_ident(&field.alias)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {projection}");

        for (index, table) in self.tables.iter().enumerate() {
            let table_sql = format!(
                "{} AS {}",
                quote_ident(&self.physical_table(&table.name)),
                quote_ident(&table.alias)
            );
            if index == 0 {
                sql.push_str(&format!(" FROM {table_sql}"));
                continue;
            }

            let conditions = self
                .join_conditions
                .iter()
                .filter(|condition| self.join_position(condition) == Some(index))
                .map(|condition| format!("{} = {}", condition.left.to_sql(), condition.right.to_sql()))
                .collect::<Vec<_>>();
            let on = if conditions.is_empty() {
                "1 = 1".to_string()
            } else {
                conditions.join(" AND ")
            };
            sql.push_str(&format!(" LEFT OUTER JOIN {table_sql} ON {on}"));
        }

        for (keyword, clause) in [
            ("WHERE", &self.where_clause),
            ("GROUP BY", &self.group_by),
            ("HAVING", &self.having),
            ("ORDER BY", &self.order_by),
        ] {
            if !clause.trim().is_empty() {
                sql.push_str(&format!(" {keyword} {}", clause.trim()));
            }
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// Index of the table whose join a condition belongs to: the later of
    /// the two tables it links.
    pub fn join_position(&self, condition: &JoinCondition) -> Option<usize> {
        let position = |alias: &str| self.tables.iter().position(|t| t.alias == alias);
        let left = position(&condition.left.table_alias)?;
        let right = position(&condition.right.table_alias)?;
        Some(left.max(right))
    }
}
