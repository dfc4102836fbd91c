//! Test utilities for SQL emission validation.
//!
//! Rendered statements are parsed back with sqlparser-rs for the matching
//! dialect, so a test fails on any syntactically broken output.

use sqlparser::parser::Parser;

use super::condition::parser_dialect;
use super::dialect::Dialect;

/// Validates that a SQL string is syntactically valid for the given dialect.
///
/// # Example
///
/// ```ignore
/// use crate::sql::test_utils::validate_sql;
/// use crate::sql::dialect::Dialect;
///
/// validate_sql("DELETE FROM people", Dialect::Sqlite).unwrap();
/// ```
pub fn validate_sql(sql: &str, dialect: Dialect) -> Result<(), String> {
    let parser = parser_dialect(dialect);

    Parser::parse_sql(&*parser, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL for {:?}: {}\nSQL: {}", dialect, e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("DELETE FROM people WHERE id = 1", Dialect::Postgres).unwrap();
        validate_sql("UPDATE people SET name = 'x'", Dialect::MySql).unwrap();
        validate_sql("SELECT * FROM people LIMIT 1", Dialect::Sqlite).unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("UPDTE people SET", Dialect::Postgres);
        assert!(result.is_err());
    }
}
