//! Query safety validation.
//!
//! Caller-supplied clause fragments are spliced into generated SQL, so they
//! are screened twice: each fragment is checked for statement terminators,
//! comments and nested SELECTs, and the rendered statement is parsed with
//! sqlparser and must be exactly one plain SELECT.

use regex::Regex;
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::sync::OnceLock;

use crate::error::{ExportError, Result};

/// Substrings never allowed inside a clause fragment.
const FORBIDDEN_SEQUENCES: &[&str] = &[";", "--", "/*", "*/", "#"];

/// Checks a single caller-supplied clause (`where`, `order_by`, a field
/// expression, ...). `clause` names it in the error message.
pub fn validate_clause(clause: &str, text: &str) -> Result<()> {
    static SELECT_RE: OnceLock<Regex> = OnceLock::new();
    let select_re =
        SELECT_RE.get_or_init(|| Regex::new(r"(?i)\bselect\b").expect("valid select regex"));

    if let Some(sequence) = FORBIDDEN_SEQUENCES.iter().find(|seq| text.contains(**seq)) {
        return Err(ExportError::configuration(format!(
            "Error in \"{clause}\" parameter: the string \"{sequence}\" cannot be used"
        )));
    }
    if select_re.is_match(text) {
        return Err(ExportError::configuration(format!(
            "Error in \"{clause}\" parameter: nested SELECT statements are not allowed"
        )));
    }
    Ok(())
}

/// Parses a fully rendered statement and requires a single plain SELECT.
pub fn validate_statement(sql: &str) -> Result<()> {
    let statements = Parser::parse_sql(&GenericDialect {}, sql)
        .map_err(|e| ExportError::configuration(format!("Invalid query: {e}")))?;

    match statements.as_slice() {
        [Statement::Query(query)] => {
            if query.with.is_some() {
                return Err(ExportError::configuration(
                    "Invalid query: WITH clauses are not allowed",
                ));
            }
            match query.body.as_ref() {
                SetExpr::Select(_) => Ok(()),
                _ => Err(ExportError::configuration(
                    "Invalid query: only a single SELECT is allowed",
                )),
            }
        }
        [] => Err(ExportError::configuration("Invalid query: empty statement")),
        [_] => Err(ExportError::configuration(
            "Invalid query: only SELECT statements are allowed",
        )),
        _ => Err(ExportError::configuration(
            "Invalid query: multiple statements are not allowed",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_clauses_pass() {
        assert!(validate_clause("where", "books.year > 1990 AND title LIKE 'D%'").is_ok());
        assert!(validate_clause("order_by", "published DESC").is_ok());
        assert!(validate_clause("where", "selected = 1").is_ok());
    }

    #[test]
    fn test_statement_terminator_rejected() {
        let err = validate_clause("where", "1=1; DROP TABLE users").unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
        assert!(err.to_string().contains("\";\""));
    }

    #[test]
    fn test_comments_rejected() {
        assert!(validate_clause("where", "1=1 -- trailing").is_err());
        assert!(validate_clause("having", "/* x */ 1").is_err());
    }

    #[test]
    fn test_nested_select_rejected() {
        assert!(validate_clause("where", "id IN (SELECT id FROM secrets)").is_err());
    }

    #[test]
    fn test_statement_must_be_single_select() {
        assert!(validate_statement(
            "SELECT \"b\".\"title\" AS \"title\" FROM \"cargo__books\" AS \"b\" LIMIT 100"
        )
        .is_ok());
        assert!(validate_statement("DELETE FROM users").is_err());
        assert!(validate_statement("SELECT 1; SELECT 2").is_err());
        assert!(validate_statement("SELECT 1 UNION SELECT 2").is_err());
        assert!(validate_statement("WITH x AS (SELECT 1) SELECT * FROM x").is_err());
        assert!(validate_statement("SELEC 1").is_err());
    }
}
