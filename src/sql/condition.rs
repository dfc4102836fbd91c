//! Recovers `attribute = literal` bindings from rendered condition text.
//!
//! Mapping rules hand back their refined conditions as SQL text. This
//! scanner tokenizes that text with the sqlparser tokenizer and, for every
//! `=` token, reads a qualified attribute on the left and a literal on the
//! right. Literals may span several tokens:
//!
//! - a qualified name on the right (`"t"."c"`) is concatenated back together
//! - `DATE` / `TIMESTAMP` is reattached to the following literal with no
//!   space, so `DATE '2020-01-01'` becomes `DATE'2020-01-01'`
//! - a leading minus sign is joined to the number it negates
//!
//! Comparisons other than `=` are ignored.

use sqlparser::dialect::{
    DuckDbDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::tokenizer::{Token, Tokenizer, Word};
use thiserror::Error;

use super::dialect::helpers::{quote_string_single, quote_string_unicode};
use super::dialect::{Dialect, SqlDialect};
use crate::model::{Attribute, BindingMap, RelationName, Value};

#[derive(Debug, Error)]
#[error("cannot recover bindings from condition `{condition}`: {reason}")]
pub struct ConditionError {
    pub condition: String,
    pub reason: String,
}

/// sqlparser dialect that tokenizes text rendered for `dialect`.
pub fn parser_dialect(dialect: Dialect) -> Box<dyn sqlparser::dialect::Dialect> {
    match dialect {
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::DuckDb => Box::new(DuckDbDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
    }
}

/// Scan `condition` for equalities and return them as bindings.
pub fn scan_equalities(condition: &str, dialect: Dialect) -> Result<BindingMap, ConditionError> {
    let fail = |reason: String| ConditionError {
        condition: condition.to_string(),
        reason,
    };

    let parser = parser_dialect(dialect);
    let tokens: Vec<Token> = Tokenizer::new(&*parser, condition)
        .tokenize()
        .map_err(|e| fail(e.to_string()))?
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_)))
        .collect();

    let mut bindings = BindingMap::new();
    for (index, token) in tokens.iter().enumerate() {
        if *token != Token::Eq {
            continue;
        }
        let attribute = left_attribute(&tokens, index).map_err(&fail)?;
        let value = right_value(&tokens, index, dialect).map_err(&fail)?;
        bindings.insert(attribute, value);
    }
    Ok(bindings)
}

fn word_at(tokens: &[Token], index: usize) -> Option<&Word> {
    match tokens.get(index) {
        Some(Token::Word(w)) => Some(w),
        _ => None,
    }
}

fn is_period(tokens: &[Token], index: usize) -> bool {
    matches!(tokens.get(index), Some(Token::Period))
}

fn left_attribute(tokens: &[Token], eq: usize) -> Result<Attribute, String> {
    let column = eq
        .checked_sub(1)
        .and_then(|i| word_at(tokens, i))
        .ok_or_else(|| "left side of `=` is not a column".to_string())?;

    let table = (eq >= 3 && is_period(tokens, eq - 2))
        .then(|| word_at(tokens, eq - 3))
        .flatten()
        .ok_or_else(|| format!("column `{}` is not table-qualified", column.value))?;

    let schema = (eq >= 5 && is_period(tokens, eq - 4))
        .then(|| word_at(tokens, eq - 5))
        .flatten();

    let relation = match schema {
        Some(schema) => RelationName::with_schema(schema.value.clone(), table.value.clone()),
        None => RelationName::new(table.value.clone()),
    };
    Ok(Attribute::new(relation, column.value.clone()))
}

fn render(token: &Token, dialect: Dialect) -> String {
    match token {
        Token::Number(n, _) => n.clone(),
        Token::SingleQuotedString(s) => quote_string_single(s),
        Token::NationalStringLiteral(s) => quote_string_unicode(s),
        Token::Word(w) if w.quote_style.is_some() => dialect.quote_identifier(&w.value),
        Token::Word(w) => w.value.clone(),
        other => other.to_string(),
    }
}

fn is_typed_literal_prefix(word: &str) -> bool {
    word.eq_ignore_ascii_case("DATE") || word.eq_ignore_ascii_case("TIMESTAMP")
}

fn right_value(tokens: &[Token], eq: usize, dialect: Dialect) -> Result<Value, String> {
    let mut at = eq + 1;
    let first = tokens
        .get(at)
        .ok_or_else(|| "right side of `=` is missing".to_string())?;

    if let Token::Word(w) = first {
        if w.quote_style.is_none() && w.value.eq_ignore_ascii_case("NULL") {
            return Ok(Value::Null);
        }
    }

    let mut text = render(first, dialect);
    if *first == Token::Minus {
        if let Some(Token::Number(n, _)) = tokens.get(at + 1) {
            text.push_str(n);
            at += 1;
        }
    }

    if is_period(tokens, at + 1) {
        if let Some(next) = tokens.get(at + 2) {
            text.push('.');
            text.push_str(&render(next, dialect));
        }
    } else if is_typed_literal_prefix(&text) && at + 1 < tokens.len() {
        text.push_str(&render(&tokens[at + 1], dialect));
    }

    Ok(Value::Literal(text))
}
