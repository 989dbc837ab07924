//! Splitting helpers for the loosely-typed clause parameters.

use regex::Regex;
use std::sync::OnceLock;

/// Splits `text` on `separator` wherever it is outside parentheses and
/// quotes, trimming each piece and dropping empty ones.
pub fn split_top_level(text: &str, separator: char) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                pieces.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    pieces.push(current);

    pieces
        .into_iter()
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}

/// Splits `expr=alias` on the first top-level `=` that is not part of a
/// comparison operator (`<=`, `>=`, `!=`, `==`).
pub fn split_alias(item: &str) -> (String, Option<String>) {
    let chars: Vec<char> = item.chars().collect();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, '=') if depth == 0 => {
                let prev = i.checked_sub(1).map(|p| chars[p]);
                let next = chars.get(i + 1).copied();
                let is_operator =
                    matches!(prev, Some('<' | '>' | '!' | '=')) || next == Some('=');
                if !is_operator {
                    let expr: String = chars[..i].iter().collect();
                    let alias: String = chars[i + 1..].iter().collect();
                    let alias = alias.trim();
                    return (
                        expr.trim().to_string(),
                        (!alias.is_empty()).then(|| alias.to_string()),
                    );
                }
            }
            _ => {}
        }
    }

    (item.trim().to_string(), None)
}

/// A plain column reference: `field` or `table.field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub field: String,
}

fn identifier_pattern() -> &'static str {
    r"[A-Za-z_][A-Za-z0-9_]*"
}

/// Parses a plain (optionally qualified) column reference.
pub fn parse_column_ref(expr: &str) -> Option<ColumnRef> {
    static COLUMN_RE: OnceLock<Regex> = OnceLock::new();
    let column_re = COLUMN_RE.get_or_init(|| {
        let ident = identifier_pattern();
        Regex::new(&format!(r"^(?:({ident})\.)?({ident})$")).expect("valid column regex")
    });

    let caps = column_re.captures(expr.trim())?;
    Some(ColumnRef {
        table: caps.get(1).map(|m| m.as_str().to_string()),
        field: caps[2].to_string(),
    })
}

/// Aggregate functions whose result type can be derived from the argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Min,
    Max,
    Count,
    Sum,
    Avg,
}

/// Parses `FUNC(column)` / `FUNC(DISTINCT column)` / `COUNT(*)`.
///
/// The returned reference is `None` for `*`.
pub fn parse_aggregate(expr: &str) -> Option<(Aggregate, Option<ColumnRef>)> {
    static AGGREGATE_RE: OnceLock<Regex> = OnceLock::new();
    let aggregate_re = AGGREGATE_RE.get_or_init(|| {
        let ident = identifier_pattern();
        Regex::new(&format!(
            r"(?i)^(MIN|MAX|COUNT|SUM|AVG)\s*\(\s*(?:DISTINCT\s+)?((?:{ident}\.)?{ident}|\*)\s*\)$"
        ))
        .expect("valid aggregate regex")
    });

    let caps = aggregate_re.captures(expr.trim())?;
    let aggregate = match caps[1].to_uppercase().as_str() {
        "MIN" => Aggregate::Min,
        "MAX" => Aggregate::Max,
        "COUNT" => Aggregate::Count,
        "SUM" => Aggregate::Sum,
        _ => Aggregate::Avg,
    };
    let argument = &caps[2];
    let column = if argument == "*" {
        None
    } else {
        Some(parse_column_ref(argument)?)
    };
    Some((aggregate, column))
}

/// True when a computed expression yields a date (`DATE(...)` and friends).
pub fn is_date_function(expr: &str) -> bool {
    static DATE_RE: OnceLock<Regex> = OnceLock::new();
    DATE_RE
        .get_or_init(|| {
            Regex::new(r"(?i)^(DATE|DATE_FORMAT|STR_TO_DATE|FROM_DAYS)\s*\(").expect("valid date regex")
        })
        .is_match(expr.trim())
}

/// True when `name` is a bare SQL identifier.
pub fn is_identifier(name: &str) -> bool {
    parse_column_ref(name).is_some_and(|column| column.table.is_none())
}

/// Double-quotes an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders text as a single-quoted SQL string literal.
pub fn sql_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
