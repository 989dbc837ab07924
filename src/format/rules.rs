//! Ordered "named field, else positional fallback" resolution rules.

use crate::db::Value;
use crate::query::ResultRow;

/// Where a rule looks for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// A column with exactly this alias, present even when NULL.
    Named(&'static str),
    /// The first projected column.
    FirstColumn,
    /// The n-th Date/Datetime field of the query.
    DateField(usize),
}

/// Sources tried in order; the first one present in the row wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule(pub &'static [FieldSource]);

impl FieldRule {
    pub const TITLE: Self = Self(&[FieldSource::Named("name"), FieldSource::FirstColumn]);
    pub const COLOR: Self = Self(&[FieldSource::Named("color")]);
    pub const TEXT_COLOR: Self = Self(&[FieldSource::Named("text color")]);
    pub const START: Self = Self(&[FieldSource::Named("start"), FieldSource::DateField(0)]);
    pub const END: Self = Self(&[FieldSource::Named("end"), FieldSource::DateField(1)]);
    pub const DESCRIPTION: Self = Self(&[FieldSource::Named("description")]);
    pub const FIRST_DATE: Self = Self(&[FieldSource::DateField(0)]);

    /// Resolves the rule against one row. `date_aliases` lists the query's
    /// date fields in projection order.
    pub fn resolve<'r>(&self, row: &'r ResultRow, date_aliases: &[String]) -> Option<&'r Value> {
        self.0.iter().find_map(|source| match source {
            FieldSource::Named(alias) => row.get(alias),
            FieldSource::FirstColumn => row.first().map(|(_, value)| value),
            FieldSource::DateField(index) => date_aliases
                .get(*index)
                .and_then(|alias| row.get(alias)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entries: &[(&str, Value)]) -> ResultRow {
        entries
            .iter()
            .map(|(alias, value)| (alias.to_string(), value.clone()))
            .collect()
    }

    fn dates() -> Vec<String> {
        vec!["began".to_string(), "ended".to_string()]
    }

    #[test]
    fn test_named_field_wins_even_when_null() {
        let row = row(&[("title", Value::from("Dune")), ("name", Value::Null)]);
        assert_eq!(FieldRule::TITLE.resolve(&row, &dates()), Some(&Value::Null));
    }

    #[test]
    fn test_falls_back_to_first_column() {
        let row = row(&[("title", Value::from("Dune")), ("began", Value::from("2020"))]);
        assert_eq!(
            FieldRule::TITLE.resolve(&row, &dates()),
            Some(&Value::from("Dune"))
        );
    }

    #[test]
    fn test_date_field_positions() {
        let row = row(&[
            ("title", Value::from("Dune")),
            ("began", Value::from("2020-01-01")),
            ("ended", Value::from("2020-01-05")),
        ]);
        assert_eq!(
            FieldRule::START.resolve(&row, &dates()),
            Some(&Value::from("2020-01-01"))
        );
        assert_eq!(
            FieldRule::END.resolve(&row, &dates()),
            Some(&Value::from("2020-01-05"))
        );
        assert_eq!(FieldRule::END.resolve(&row, &dates()[..1]), None);
        assert_eq!(FieldRule::COLOR.resolve(&row, &dates()), None);
    }
}
